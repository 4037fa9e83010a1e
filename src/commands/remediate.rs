//! Remediation commands.
//!
//! - `deactivate-keys` - mark stale access keys inactive
//! - `delete-keys` - delete stale access keys
//! - `revoke-passwords` - delete the login profile of users with a stale password
//!
//! All three honour `--dry-run` (nothing is changed, every intended action is
//! logged) and `--notify-slack` (one message per action).
//!
//! # Usage
//!
//! ```bash
//! # Preview what would be deactivated
//! awsklean --dry-run deactivate-keys --days 90
//!
//! # Delete keys unused for 180 days and notify the channel
//! AWSKLEAN_SLACK_WEBHOOK=https://hooks.slack.com/... awsklean --notify-slack delete-keys --days 180
//! ```

use crate::context::RunContext;
use crate::exclusion::ExclusionSet;
use crate::iam_api::IdentityProvider;
use crate::notify::Notifier;
use crate::pipeline::collect_verdicts;
use crate::remediation::{ActionStatus, KeyAction, RemediationOutcome, Remediator};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationKind {
    DeactivateKeys,
    DeleteKeys,
    RevokePasswords,
}

impl RemediationKind {
    fn title(self) -> &'static str {
        match self {
            RemediationKind::DeactivateKeys => "Deactivate Stale Access Keys",
            RemediationKind::DeleteKeys => "Delete Stale Access Keys",
            RemediationKind::RevokePasswords => "Revoke Stale Passwords",
        }
    }
}

pub async fn run<P, N>(
    provider: &P,
    notifier: &N,
    ctx: &RunContext,
    exclusions: &ExclusionSet,
    retention_days: u32,
    kind: RemediationKind,
) -> Result<RemediationOutcome>
where
    P: IdentityProvider + ?Sized,
    N: Notifier + ?Sized,
{
    eprintln!("=== {} ===", kind.title());
    eprintln!("Account: {}", ctx.account_label);
    eprintln!("Retention window: {} days", retention_days);
    if ctx.dry_run {
        eprintln!("DRY RUN: no changes will be made");
    }
    eprintln!();

    let verdicts = collect_verdicts(provider, ctx, exclusions, retention_days).await?;
    let remediator = Remediator::new(provider, notifier, ctx);

    let outcome = match kind {
        RemediationKind::DeactivateKeys => remediator.apply(&verdicts, KeyAction::Deactivate).await,
        RemediationKind::DeleteKeys => remediator.apply(&verdicts, KeyAction::Delete).await,
        RemediationKind::RevokePasswords => remediator.revoke_passwords(&verdicts).await,
    };

    for record in &outcome.records {
        let target = match &record.access_key_id {
            Some(id) => format!("{} ({})", record.method, id),
            None => record.method.to_string(),
        };
        let status = match &record.status {
            ActionStatus::Applied => "done".to_string(),
            ActionStatus::DryRun => "dry run".to_string(),
            ActionStatus::Skipped(reason) => format!("skipped: {}", reason),
            ActionStatus::Failed(reason) => format!("FAILED: {}", reason),
        };
        println!("{:<32} {:<40} {}", record.username, target, status);
    }

    eprintln!();
    eprintln!("=== Summary ===");
    if ctx.dry_run {
        eprintln!("Would change: {}", outcome.dry_run());
    } else {
        eprintln!("Changed: {}", outcome.applied());
        eprintln!("Skipped: {}", outcome.skipped());
        eprintln!("Failed: {}", outcome.failed());
    }

    Ok(outcome)
}
