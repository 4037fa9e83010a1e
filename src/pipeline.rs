//! Fetch, parse and classify in one step.

use crate::context::RunContext;
use crate::error::AuditResult;
use crate::exclusion::ExclusionSet;
use crate::iam_api::{fetch_credential_report, IdentityProvider};
use crate::policy::{classify, VerdictSet};
use crate::report::parser::parse_report;
use tracing::{info, warn};

/// Download the credential report and classify every user in it.
pub async fn collect_verdicts<P: IdentityProvider + ?Sized>(
    provider: &P,
    ctx: &RunContext,
    exclusions: &ExclusionSet,
    retention_days: u32,
) -> AuditResult<VerdictSet> {
    let raw = fetch_credential_report(provider, ctx.report_retry_delay).await?;
    let report = parse_report(&raw);

    if report.skipped > 0 {
        warn!(skipped = report.skipped, "some credential report rows could not be read");
    }

    let verdicts = classify(&report.rows, exclusions, retention_days, ctx.now);
    info!(
        users = report.rows.len(),
        excluded = report.rows.len() - verdicts.len(),
        retention_days,
        "credential report classified"
    );

    Ok(verdicts)
}
