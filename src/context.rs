use crate::iam_api::REPORT_RETRY_DELAY;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Per-invocation settings shared by every command.
///
/// Built once in `main` and passed down explicitly.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Log intended changes without calling the provider
    pub dry_run: bool,
    /// Send a notification for every remediation action
    pub notify: bool,
    /// Account alias or id, used in headers and messages
    pub account_label: String,
    /// Captured once so the whole run uses the same cutoff
    pub now: DateTime<Utc>,
    /// Wait before the single retry when the credential report is not ready
    pub report_retry_delay: Duration,
}

impl RunContext {
    pub fn new(dry_run: bool, notify: bool, account_label: String) -> Self {
        Self {
            dry_run,
            notify,
            account_label,
            now: Utc::now(),
            report_retry_delay: REPORT_RETRY_DELAY,
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_report_retry_delay(mut self, delay: Duration) -> Self {
        self.report_retry_delay = delay;
        self
    }
}
