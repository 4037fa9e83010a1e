//! Accounts with no usable credential at all.
//!
//! A user is listed when the console password and both access keys are
//! disabled or absent. Such accounts are candidates for removal.
//!
//! # Usage
//!
//! ```bash
//! awsklean unused-accounts
//! awsklean unused-accounts --format json --output unused.json
//! ```

use crate::context::RunContext;
use crate::exclusion::ExclusionSet;
use crate::iam_api::IdentityProvider;
use crate::pipeline::collect_verdicts;
use crate::policy::fully_unused_accounts;
use crate::utils::output::{emit, OutputFormat, Table};
use anyhow::Result;

pub async fn run<P: IdentityProvider + ?Sized>(
    provider: &P,
    ctx: &RunContext,
    exclusions: &ExclusionSet,
    retention_days: u32,
    output: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let verdicts = collect_verdicts(provider, ctx, exclusions, retention_days).await?;
    let unused = fully_unused_accounts(&verdicts);

    eprintln!(
        "{} account(s) in {} without any usable credential",
        unused.len(),
        ctx.account_label
    );

    let mut table = Table::new(vec!["user"]);
    for username in &unused {
        table.push(vec![username.clone()]);
    }

    emit(output, format, &unused, &table)
}
