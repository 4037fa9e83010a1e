use anyhow::Result;
use awsklean::commands;
use awsklean::commands::remediate::RemediationKind;
use awsklean::context::RunContext;
use awsklean::error::AuditError;
use awsklean::exclusion::ExclusionResolver;
use awsklean::iam_api::{AwsIamClient, IdentityProvider};
use awsklean::notify::{NoopNotifier, Notifier, SlackNotifier};
use awsklean::session::{resolve_sdk_config, CredentialSource, RoleTarget, SessionOptions};
use awsklean::utils::output::OutputFormat;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "awsklean")]
#[command(about = "Find and clean up unused AWS IAM passwords and access keys", long_about = None)]
#[command(version)]
struct Cli {
    /// Show what would be changed without changing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Send a notification for every action to $AWSKLEAN_SLACK_WEBHOOK
    #[arg(long, global = true)]
    notify_slack: bool,

    /// AWS profile from the shared credentials/config files
    #[arg(long, global = true, conflicts_with = "aws_key_id")]
    profile: Option<String>,

    /// Access key id for an explicit key pair (requires --aws-secret)
    #[arg(long, global = true, requires = "aws_secret")]
    aws_key_id: Option<String>,

    /// Secret access key for an explicit key pair (requires --aws-key-id)
    #[arg(long, global = true, requires = "aws_key_id")]
    aws_secret: Option<String>,

    /// Role to assume, as "<ACCOUNT_NUMBER>,<ROLE_NAME>"
    #[arg(long, global = true)]
    role: Option<String>,

    /// Profile to use when running under Jenkins ($JENKINS_URL set)
    #[arg(long, global = true)]
    jenkins_profile: Option<String>,

    /// AWS region override
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Download the super-user list from this URL, replacing any cached copy
    #[arg(long, global = true, env = "AWSKLEAN_SUPER_USERS_URL")]
    super_users_url: Option<String>,

    /// Local cache file for the super-user list
    #[arg(long, global = true, env = "AWSKLEAN_SUPER_USERS_CACHE")]
    super_users_cache: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArgs {
    /// Retention window in days
    #[arg(long, default_value = "60")]
    days: u32,
}

#[derive(Args)]
struct ListingArgs {
    #[command(flatten)]
    window: WindowArgs,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the staleness decision for every user and access method
    Report(ListingArgs),

    /// List users with at least one never-used or stale credential
    StaleUsers(ListingArgs),

    /// List users with no usable password or access key
    UnusedAccounts(ListingArgs),

    /// Deactivate never-used and stale access keys
    DeactivateKeys(WindowArgs),

    /// Delete never-used and stale access keys
    DeleteKeys(WindowArgs),

    /// Revoke console passwords that are never used or stale
    RevokePasswords(WindowArgs),

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,awsklean=debug"
    } else {
        "warn,awsklean=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_notifier(enabled: bool) -> Result<Box<dyn Notifier>> {
    if !enabled {
        return Ok(Box::new(NoopNotifier));
    }
    let notifier = SlackNotifier::from_env()?;
    debug!("notifications enabled");
    Ok(Box::new(notifier))
}

async fn connect(cli: &Cli) -> Result<AwsIamClient> {
    let jenkins_url = std::env::var("JENKINS_URL").ok();
    let source = CredentialSource::select(
        cli.profile.as_deref(),
        cli.aws_key_id.as_deref(),
        cli.aws_secret.as_deref(),
        cli.jenkins_profile.as_deref(),
        jenkins_url.as_deref(),
    )?;
    let role = cli.role.as_deref().map(str::parse::<RoleTarget>).transpose()?;

    let options = SessionOptions {
        source,
        role,
        region: cli.region.clone(),
    };
    let config = resolve_sdk_config(&options).await?;
    Ok(AwsIamClient::new(&config))
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::GenerateCompletion { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "awsklean", &mut std::io::stdout());
        return Ok(());
    }

    let notifier = build_notifier(cli.notify_slack)?;
    let client = connect(&cli).await?;

    let resolver = ExclusionResolver::from_options(
        cli.super_users_cache.as_deref(),
        cli.super_users_url.as_deref(),
    );
    let exclusions = resolver.resolve().await?;

    let account_label = client.account_label().await;
    info!(account = %account_label, "connected");
    let ctx = RunContext::new(cli.dry_run, cli.notify_slack, account_label);

    match cli.command {
        Commands::Report(args) => {
            commands::staleness_report::run(
                &client,
                &ctx,
                &exclusions,
                args.window.days,
                args.output.as_deref(),
                args.format,
            )
            .await
        }
        Commands::StaleUsers(args) => {
            commands::stale_users::run(
                &client,
                &ctx,
                &exclusions,
                args.window.days,
                args.output.as_deref(),
                args.format,
            )
            .await
        }
        Commands::UnusedAccounts(args) => {
            commands::unused_accounts::run(
                &client,
                &ctx,
                &exclusions,
                args.window.days,
                args.output.as_deref(),
                args.format,
            )
            .await
        }
        Commands::DeactivateKeys(args) => commands::remediate::run(
            &client,
            &*notifier,
            &ctx,
            &exclusions,
            args.days,
            RemediationKind::DeactivateKeys,
        )
        .await
        .map(|_| ()),
        Commands::DeleteKeys(args) => commands::remediate::run(
            &client,
            &*notifier,
            &ctx,
            &exclusions,
            args.days,
            RemediationKind::DeleteKeys,
        )
        .await
        .map(|_| ()),
        Commands::RevokePasswords(args) => commands::remediate::run(
            &client,
            &*notifier,
            &ctx,
            &exclusions,
            args.days,
            RemediationKind::RevokePasswords,
        )
        .await
        .map(|_| ()),
        Commands::GenerateCompletion { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<AuditError>() {
            Some(audit) if !audit.is_fatal() => {
                warn!("{:#}", err);
                ExitCode::SUCCESS
            }
            audit => {
                eprintln!("Error: {:#}", err);
                if let Some(hint) = audit.and_then(AuditError::hint) {
                    eprintln!();
                    eprintln!("{}", hint);
                }
                ExitCode::FAILURE
            }
        },
    }
}
