//! Aggregations over a [`VerdictSet`].
//!
//! These are pure functions; they never touch the identity provider.

use super::classifier::{AccessVerdict, VerdictSet};
use crate::report::types::AccessMethod;
use serde::Serialize;

/// A user with at least one method due for remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleUser {
    pub username: String,
    pub methods: Vec<AccessMethod>,
}

/// Users with one or more `Unused` or `Stale` methods.
pub fn users_with_stale_methods(verdicts: &VerdictSet) -> Vec<StaleUser> {
    verdicts
        .iter()
        .filter_map(|(username, user)| {
            let methods = user.candidates();
            (!methods.is_empty()).then(|| StaleUser {
                username: username.clone(),
                methods,
            })
        })
        .collect()
}

/// Users whose password and both access keys are all not applicable.
///
/// These accounts cannot be used to sign in at all and are candidates for
/// removal.
pub fn fully_unused_accounts(verdicts: &VerdictSet) -> Vec<String> {
    verdicts
        .iter()
        .filter(|(_, user)| user.iter().all(|(_, v)| v == AccessVerdict::NotApplicable))
        .map(|(username, _)| username.clone())
        .collect()
}

/// Verdict counts across all evaluated methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub users: usize,
    pub not_applicable: usize,
    pub unused: usize,
    pub stale: usize,
    pub fresh: usize,
}

impl PlanSummary {
    pub fn candidates(&self) -> usize {
        self.unused + self.stale
    }
}

pub fn summarize(verdicts: &VerdictSet) -> PlanSummary {
    let mut summary = PlanSummary {
        users: verdicts.len(),
        ..PlanSummary::default()
    };

    for (_, verdict) in verdicts.values().flat_map(|u| u.iter()) {
        match verdict {
            AccessVerdict::NotApplicable => summary.not_applicable += 1,
            AccessVerdict::Unused => summary.unused += 1,
            AccessVerdict::Stale => summary.stale += 1,
            AccessVerdict::Fresh => summary.fresh += 1,
        }
    }

    summary
}
