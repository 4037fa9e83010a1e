//! Progress indicators using indicatif
//!
//! Only a spinner is needed: the one long wait in a run is IAM generating
//! the credential report.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use std::time::Duration;

/// Spinner wrapper for displaying wait status
pub struct ProgressBar {
    bar: IndicatifBar,
}

impl ProgressBar {
    /// Create a ticking spinner with a message
    pub fn new_spinner(label: &str) -> Self {
        let bar = IndicatifBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        Self { bar }
    }

    /// Remove the spinner from the terminal
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
