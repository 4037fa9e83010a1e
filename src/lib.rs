//! # awsklean
//!
//! Command-line tool for finding and cleaning up unused AWS IAM credentials.
//!
//! ## Overview
//!
//! `awsklean` downloads the IAM credential report for one account, decides
//! for every user whether the console password and each of the two access
//! keys has gone unused for longer than a retention window, and can then
//! deactivate or delete the stale keys and revoke stale passwords.
//!
//! Users on the super-user list are never evaluated and never touched.
//!
//! ## Decisions
//!
//! Each access method of each user gets one verdict:
//!
//! | Verdict         | Meaning                                   | Remediated |
//! |-----------------|-------------------------------------------|------------|
//! | `NotApplicable` | disabled or not present                   | no         |
//! | `Unused`        | enabled, no recorded use                  | yes        |
//! | `Stale`         | last used before the retention cutoff     | yes        |
//! | `Fresh`         | used within the retention window          | no         |
//!
//! ## Architecture
//!
//! - [`report`] - Credential report parsing and row types
//! - [`exclusion`] - Super-user list from a local cache or remote URL
//! - [`policy`] - Staleness classification and aggregations
//! - [`remediation`] - Revoke, deactivate or delete flagged credentials
//! - [`iam_api`] - Identity provider seam and the AWS SDK implementation
//! - [`session`] - Profile, key pair and assume-role session resolution
//! - [`notify`] - Best-effort webhook notifications
//! - [`commands`] - CLI command implementations
//! - [`utils`] - Output, progress and time helpers
//!
//! ## Example Usage
//!
//! ```bash
//! # Staleness decisions with a 90 day window
//! awsklean report --days 90
//!
//! # Users with at least one stale credential, as CSV
//! awsklean stale-users --format csv --output stale.csv
//!
//! # Preview key deactivation under an assumed role
//! awsklean --role 123456789012,SecurityAudit --dry-run deactivate-keys
//! ```

pub mod commands;
pub mod context;
pub mod error;
pub mod exclusion;
pub mod iam_api;
pub mod notify;
pub mod pipeline;
pub mod policy;
pub mod remediation;
pub mod report;
pub mod session;
pub mod utils;
