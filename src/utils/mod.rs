//! Utility functions and helpers.
//!
//! - [`output`] - Text, JSON and CSV listing output
//! - [`progress`] - Spinner shown while waiting on IAM
//! - [`time`] - Timestamp parsing and retention cutoff helpers
//!
//! # Examples
//!
//! ```
//! use awsklean::utils::time::{parse_timestamp, retention_cutoff};
//!
//! let now = parse_timestamp("2024-06-01T00:00:00Z").unwrap();
//! let cutoff = retention_cutoff(now, 60);
//! assert_eq!(cutoff, parse_timestamp("2024-04-02T00:00:00Z").unwrap());
//! ```

pub mod output;
pub mod progress;
pub mod time;
