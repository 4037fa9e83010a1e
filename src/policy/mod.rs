//! Retention-window policy.
//!
//! - [`classifier`] - Per user, per access method verdicts
//! - [`planner`] - Stale-user and fully-unused-account aggregations

pub mod classifier;
pub mod planner;

pub use classifier::{classify, AccessVerdict, UserVerdicts, VerdictSet};
pub use planner::{fully_unused_accounts, summarize, users_with_stale_methods, PlanSummary, StaleUser};
