//! Staleness classification.
//!
//! Every access method of every non-excluded user gets exactly one
//! [`AccessVerdict`]. Excluded users get no record at all.

use crate::exclusion::ExclusionSet;
use crate::report::types::{AccessMethod, CredentialRow, LastUsed};
use crate::utils::time::retention_cutoff;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Decision for one access method of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    /// Method disabled or absent.
    NotApplicable,
    /// Enabled but never used.
    Unused,
    /// Last used before the retention cutoff.
    Stale,
    /// Used within the retention window.
    Fresh,
}

impl AccessVerdict {
    /// Whether the method should be revoked, deactivated or deleted.
    ///
    /// Never-used credentials are remediated exactly like stale ones.
    pub fn is_candidate(self) -> bool {
        matches!(self, AccessVerdict::Unused | AccessVerdict::Stale)
    }

    /// Decision marker used in reports: `None` for not applicable,
    /// `Some(true)` for candidates, `Some(false)` for fresh credentials.
    pub fn marker(self) -> Option<bool> {
        match self {
            AccessVerdict::NotApplicable => None,
            AccessVerdict::Unused | AccessVerdict::Stale => Some(true),
            AccessVerdict::Fresh => Some(false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessVerdict::NotApplicable => "not_applicable",
            AccessVerdict::Unused => "unused",
            AccessVerdict::Stale => "stale",
            AccessVerdict::Fresh => "fresh",
        }
    }
}

impl Serialize for AccessVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.marker().serialize(serializer)
    }
}

/// Verdicts for the three access methods of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserVerdicts {
    #[serde(rename = "password_access")]
    pub password: AccessVerdict,
    #[serde(rename = "access_key_1_access")]
    pub access_key_1: AccessVerdict,
    #[serde(rename = "access_key_2_access")]
    pub access_key_2: AccessVerdict,
}

impl UserVerdicts {
    pub fn get(&self, method: AccessMethod) -> AccessVerdict {
        match method {
            AccessMethod::Password => self.password,
            AccessMethod::AccessKey1 => self.access_key_1,
            AccessMethod::AccessKey2 => self.access_key_2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AccessMethod, AccessVerdict)> + '_ {
        AccessMethod::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Methods flagged for remediation, in password, key 1, key 2 order
    pub fn candidates(&self) -> Vec<AccessMethod> {
        self.iter()
            .filter(|(_, v)| v.is_candidate())
            .map(|(m, _)| m)
            .collect()
    }
}

/// Verdicts keyed by username.
pub type VerdictSet = BTreeMap<String, UserVerdicts>;

/// Classify a single method given its enabled flag and last use.
pub fn classify_method(enabled: bool, last_used: LastUsed, cutoff: DateTime<Utc>) -> AccessVerdict {
    if !enabled {
        return AccessVerdict::NotApplicable;
    }
    match last_used {
        LastUsed::Absent => AccessVerdict::NotApplicable,
        LastUsed::NeverUsed => AccessVerdict::Unused,
        LastUsed::UsedAt(ts) if ts < cutoff => AccessVerdict::Stale,
        LastUsed::UsedAt(_) => AccessVerdict::Fresh,
    }
}

/// Classify one row against a precomputed cutoff.
pub fn classify_row(row: &CredentialRow, cutoff: DateTime<Utc>) -> UserVerdicts {
    let verdict = |method| {
        let (enabled, last_used) = row.method(method);
        classify_method(enabled, last_used, cutoff)
    };

    UserVerdicts {
        password: verdict(AccessMethod::Password),
        access_key_1: verdict(AccessMethod::AccessKey1),
        access_key_2: verdict(AccessMethod::AccessKey2),
    }
}

/// Classify every row of a report.
///
/// `now` is captured once by the caller so that one run uses a single
/// cutoff for all users.
pub fn classify(
    rows: &[CredentialRow],
    exclusions: &ExclusionSet,
    retention_days: u32,
    now: DateTime<Utc>,
) -> VerdictSet {
    let cutoff = retention_cutoff(now, retention_days);

    rows.iter()
        .filter(|row| !exclusions.contains(&row.username))
        .map(|row| (row.username.clone(), classify_row(row, cutoff)))
        .collect()
}
