//! Staleness report command.
//!
//! Shows, for every non-excluded user, the decision for each access method:
//!
//! - `true` - never used or not used within the retention window
//! - `false` - used within the retention window
//! - `null` - disabled or not present
//!
//! # Usage
//!
//! ```bash
//! # Default 60 day window
//! awsklean report
//!
//! # 90 day window as JSON
//! awsklean report --days 90 --format json --output staleness.json
//! ```

use crate::context::RunContext;
use crate::exclusion::ExclusionSet;
use crate::iam_api::IdentityProvider;
use crate::pipeline::collect_verdicts;
use crate::policy::{summarize, AccessVerdict};
use crate::utils::output::{emit, OutputFormat, Table};
use crate::utils::time::{format_timestamp, retention_cutoff};
use anyhow::Result;

fn marker(verdict: AccessVerdict) -> String {
    match verdict.marker() {
        Some(b) => b.to_string(),
        None => "null".to_string(),
    }
}

pub async fn run<P: IdentityProvider + ?Sized>(
    provider: &P,
    ctx: &RunContext,
    exclusions: &ExclusionSet,
    retention_days: u32,
    output: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    eprintln!("=== Credential Staleness Report ===");
    eprintln!("Account: {}", ctx.account_label);
    eprintln!(
        "Retention window: {} days (cutoff {})",
        retention_days,
        format_timestamp(&retention_cutoff(ctx.now, retention_days))
    );
    eprintln!("Super users excluded: {}", exclusions.len());
    eprintln!();

    let verdicts = collect_verdicts(provider, ctx, exclusions, retention_days).await?;

    let mut table = Table::new(vec![
        "user",
        "password_access",
        "access_key_1_access",
        "access_key_2_access",
    ]);
    for (username, user) in &verdicts {
        table.push(vec![
            username.clone(),
            marker(user.password),
            marker(user.access_key_1),
            marker(user.access_key_2),
        ]);
    }

    emit(output, format, &verdicts, &table)?;

    let summary = summarize(&verdicts);
    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Users evaluated: {}", summary.users);
    eprintln!("Never used: {}", summary.unused);
    eprintln!("Stale: {}", summary.stale);
    eprintln!("Fresh: {}", summary.fresh);
    eprintln!("Not applicable: {}", summary.not_applicable);
    eprintln!("Remediation candidates: {}", summary.candidates());

    Ok(())
}
