use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

/// Parse a timestamp string from the credential report
///
/// IAM writes `2024-01-01T00:00:00+00:00`; `Z` suffixes are accepted too.
pub fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .context("Failed to parse timestamp")
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp for display
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Instant before which a credential counts as stale
///
/// Windows reaching past the earliest representable date clamp to it, so
/// nothing is ever older than the cutoff.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(retention_days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
