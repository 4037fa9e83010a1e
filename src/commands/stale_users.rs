//! Users with at least one stale access method.
//!
//! # Usage
//!
//! ```bash
//! awsklean stale-users --days 30
//! awsklean stale-users --format csv --output stale.csv
//! ```

use crate::context::RunContext;
use crate::exclusion::ExclusionSet;
use crate::iam_api::IdentityProvider;
use crate::pipeline::collect_verdicts;
use crate::policy::users_with_stale_methods;
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
    let stale = users_with_stale_methods(&verdicts);

    eprintln!(
        "{} user(s) in {} with credentials unused for {} days",
        stale.len(),
        ctx.account_label,
        retention_days
    );

    let mut table = Table::new(vec!["user", "stale_methods"]);
    for user in &stale {
        let methods = user
            .methods
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(";");
        table.push(vec![user.username.clone(), methods]);
    }

    emit(output, format, &stale, &table)
}
