use super::types::{CredentialRow, LastUsed};
use crate::error::AuditError;
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

/// Column positions of the fields this tool reads.
///
/// Defaults follow the AWS IAM credential report schema:
///
/// ```text
/// 0 user, 3 password_enabled, 4 password_last_used,
/// 8 access_key_1_active, 10 access_key_1_last_used_date,
/// 13 access_key_2_active, 15 access_key_2_last_used_date
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    pub user: usize,
    pub password_enabled: usize,
    pub password_last_used: usize,
    pub access_key_1_active: usize,
    pub access_key_1_last_used: usize,
    pub access_key_2_active: usize,
    pub access_key_2_last_used: usize,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            user: 0,
            password_enabled: 3,
            password_last_used: 4,
            access_key_1_active: 8,
            access_key_1_last_used: 10,
            access_key_2_active: 13,
            access_key_2_last_used: 15,
        }
    }
}

impl ReportLayout {
    /// Resolve positions from the header, keeping the default position for
    /// any column the header does not name.
    pub fn from_header(header: &StringRecord) -> Self {
        let defaults = Self::default();
        let find = |name: &str, fallback: usize| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .unwrap_or(fallback)
        };

        Self {
            user: find("user", defaults.user),
            password_enabled: find("password_enabled", defaults.password_enabled),
            password_last_used: find("password_last_used", defaults.password_last_used),
            access_key_1_active: find("access_key_1_active", defaults.access_key_1_active),
            access_key_1_last_used: find(
                "access_key_1_last_used_date",
                defaults.access_key_1_last_used,
            ),
            access_key_2_active: find("access_key_2_active", defaults.access_key_2_active),
            access_key_2_last_used: find(
                "access_key_2_last_used_date",
                defaults.access_key_2_last_used,
            ),
        }
    }

    fn widest(&self) -> usize {
        [
            self.user,
            self.password_enabled,
            self.password_last_used,
            self.access_key_1_active,
            self.access_key_1_last_used,
            self.access_key_2_active,
            self.access_key_2_last_used,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Decode one record into a row.
    pub fn decode(&self, record: &StringRecord, line: usize) -> Result<CredentialRow, AuditError> {
        if record.len() <= self.widest() {
            return Err(AuditError::MalformedRow {
                line,
                reason: format!(
                    "expected at least {} columns, found {}",
                    self.widest() + 1,
                    record.len()
                ),
            });
        }

        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let last_used = |idx: usize| {
            LastUsed::decode(field(idx)).ok_or_else(|| AuditError::MalformedRow {
                line,
                reason: format!("unrecognised last-used value '{}'", field(idx)),
            })
        };

        let username = field(self.user);
        if username.is_empty() {
            return Err(AuditError::MalformedRow {
                line,
                reason: "empty user column".to_string(),
            });
        }

        Ok(CredentialRow {
            username: username.to_string(),
            password_enabled: field(self.password_enabled) == "true",
            password_last_used: last_used(self.password_last_used)?,
            access_key_1_active: field(self.access_key_1_active) == "true",
            access_key_1_last_used: last_used(self.access_key_1_last_used)?,
            access_key_2_active: field(self.access_key_2_active) == "true",
            access_key_2_last_used: last_used(self.access_key_2_last_used)?,
        })
    }
}

/// Result of parsing a credential report.
#[derive(Debug, Default)]
pub struct ParsedReport {
    pub rows: Vec<CredentialRow>,
    /// Lines that could not be decoded and were skipped
    pub skipped: usize,
}

/// Parse a raw credential report.
///
/// The first line is the header. Rows that cannot be decoded are skipped
/// individually; a bad row never fails the whole report.
pub fn parse_report(raw: &str) -> ParsedReport {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let layout = match reader.headers() {
        Ok(header) => ReportLayout::from_header(header),
        Err(e) => {
            debug!(error = %e, "unreadable report header, using default layout");
            ReportLayout::default()
        }
    };

    let mut report = ParsedReport::default();

    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!(line = fallback_line, error = %e, "skipping unreadable report row");
                report.skipped += 1;
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        match layout.decode(&record, line) {
            Ok(row) => report.rows.push(row),
            Err(e) => {
                debug!("{}", e);
                report.skipped += 1;
            }
        }
    }

    report
}
