//! Command implementations.
//!
//! Every command downloads the credential report, classifies it against the
//! retention window and the super-user list, and then either lists or
//! remediates.
//!
//! ## Reporting Commands
//!
//! - [`staleness_report`] - Per-user decision for every access method
//! - [`stale_users`] - Users with at least one never-used or stale method
//! - [`unused_accounts`] - Users with no usable credential at all
//!
//! ## Remediation Commands
//!
//! - [`remediate`] - Deactivate or delete stale access keys, revoke stale passwords

pub mod remediate;
pub mod stale_users;
pub mod staleness_report;
pub mod unused_accounts;
