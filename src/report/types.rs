//! Data structures representing AWS IAM credential report rows.
//!
//! The report mixes sentinel strings (`N/A`, `no_information`) with
//! timestamps in the same column. These are decoded once, at parse time,
//! into [`LastUsed`] so that nothing downstream compares strings.

use crate::utils::time::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// When a credential was last used, as reported by IAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum LastUsed {
    /// The credential does not exist (`N/A`, `not_supported`, or empty).
    Absent,
    /// The credential exists but IAM has no record of it being used.
    NeverUsed,
    /// Last use timestamp in UTC.
    UsedAt(DateTime<Utc>),
}

impl LastUsed {
    /// Decode a raw last-used column.
    ///
    /// Returns `None` when the value is neither a known sentinel nor a
    /// parseable timestamp.
    pub fn decode(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "N/A" | "not_supported" => Some(LastUsed::Absent),
            "no_information" => Some(LastUsed::NeverUsed),
            ts => parse_timestamp(ts).ok().map(LastUsed::UsedAt),
        }
    }
}

/// One row of the credential report.
///
/// Only the columns this tool acts on are kept; the rest of the report is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRow {
    pub username: String,
    pub password_enabled: bool,
    pub password_last_used: LastUsed,
    pub access_key_1_active: bool,
    pub access_key_1_last_used: LastUsed,
    pub access_key_2_active: bool,
    pub access_key_2_last_used: LastUsed,
}

/// An access method a user can authenticate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    Password,
    AccessKey1,
    AccessKey2,
}

impl AccessMethod {
    pub const ALL: [AccessMethod; 3] = [
        AccessMethod::Password,
        AccessMethod::AccessKey1,
        AccessMethod::AccessKey2,
    ];

    /// Report label used in listings and exports
    pub fn label(self) -> &'static str {
        match self {
            AccessMethod::Password => "password_access",
            AccessMethod::AccessKey1 => "access_key_1_access",
            AccessMethod::AccessKey2 => "access_key_2_access",
        }
    }

    /// Zero-based position among the user's access keys, `None` for passwords.
    pub fn key_index(self) -> Option<usize> {
        match self {
            AccessMethod::Password => None,
            AccessMethod::AccessKey1 => Some(0),
            AccessMethod::AccessKey2 => Some(1),
        }
    }
}

impl std::fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AccessMethod::Password => "password",
            AccessMethod::AccessKey1 => "access key 1",
            AccessMethod::AccessKey2 => "access key 2",
        })
    }
}

impl CredentialRow {
    /// Enabled flag and last-used value for a method
    pub fn method(&self, method: AccessMethod) -> (bool, LastUsed) {
        match method {
            AccessMethod::Password => (self.password_enabled, self.password_last_used),
            AccessMethod::AccessKey1 => (self.access_key_1_active, self.access_key_1_last_used),
            AccessMethod::AccessKey2 => (self.access_key_2_active, self.access_key_2_last_used),
        }
    }
}
