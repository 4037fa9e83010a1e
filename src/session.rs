//! AWS session resolution.
//!
//! Resolution is a two-step pipeline: build a base SDK configuration from
//! the selected credential source, then optionally exchange it for
//! temporary credentials by assuming a role.

use crate::error::{AuditError, AuditResult};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use rand::Rng;
use std::str::FromStr;
use tracing::{debug, info};

/// Where the base credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Default provider chain (environment, default profile, instance role)
    DefaultChain,
    /// Named profile from the shared AWS config files
    Profile(String),
    /// Explicit access key pair
    StaticKeys {
        access_key_id: String,
        secret_access_key: String,
    },
}

impl CredentialSource {
    /// Pick the base credential source from CLI options.
    ///
    /// Explicit keys win over a profile. When running under Jenkins
    /// (`jenkins_url` set) and nothing explicit was given, a Jenkins profile
    /// is required.
    pub fn select(
        profile: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        jenkins_profile: Option<&str>,
        jenkins_url: Option<&str>,
    ) -> AuditResult<Self> {
        match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) => {
                return Ok(CredentialSource::StaticKeys {
                    access_key_id: id.to_string(),
                    secret_access_key: secret.to_string(),
                })
            }
            (None, None) => {}
            _ => {
                return Err(AuditError::CredentialResolution(
                    "an explicit key pair needs both --aws-key-id and --aws-secret".to_string(),
                ))
            }
        }

        if let Some(name) = profile {
            return Ok(CredentialSource::Profile(name.to_string()));
        }

        if jenkins_url.is_some() {
            return match jenkins_profile {
                Some(name) => Ok(CredentialSource::Profile(name.to_string())),
                None => Err(AuditError::CredentialResolution(
                    "running under Jenkins without --jenkins-profile".to_string(),
                )),
            };
        }

        Ok(CredentialSource::DefaultChain)
    }
}

/// Role to assume, parsed from `"<ACCOUNT_NUMBER>,<ROLE_NAME>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTarget {
    pub account_id: String,
    pub role_name: String,
}

impl RoleTarget {
    pub fn arn(&self) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account_id, self.role_name)
    }
}

impl FromStr for RoleTarget {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            AuditError::CredentialResolution(format!(
                "role '{}' must be a comma-separated \"<ACCOUNT_NUMBER>,<ROLE_NAME>\" string",
                s
            ))
        };

        let (account, role) = s.split_once(',').ok_or_else(malformed)?;
        let (account, role) = (account.trim(), role.trim());
        if account.is_empty() || role.is_empty() || role.contains(',') {
            return Err(malformed());
        }
        if !account.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        Ok(RoleTarget {
            account_id: account.to_string(),
            role_name: role.to_string(),
        })
    }
}

/// Everything needed to build a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub source: CredentialSource,
    pub role: Option<RoleTarget>,
    pub region: Option<String>,
}

/// Session name for `AssumeRole`
pub fn role_session_name() -> String {
    format!("AssumeRoleSession{}", rand::thread_rng().gen_range(1..=101))
}

/// Resolve the SDK configuration and make sure it can authenticate.
pub async fn resolve_sdk_config(options: &SessionOptions) -> AuditResult<SdkConfig> {
    let base = load_base_config(&options.source, options.region.as_deref()).await;

    let config = match &options.role {
        Some(role) => assume_role(&base, role).await?,
        None => base,
    };

    verify_session(&config).await?;
    Ok(config)
}

async fn load_base_config(source: &CredentialSource, region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }

    loader = match source {
        CredentialSource::DefaultChain => {
            debug!("using default AWS credential chain");
            loader
        }
        CredentialSource::Profile(name) => {
            info!(profile = %name, "using AWS profile");
            loader.profile_name(name)
        }
        CredentialSource::StaticKeys {
            access_key_id,
            secret_access_key,
        } => {
            info!("connecting with an explicit access key pair");
            loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                "awsklean-static",
            ))
        }
    };

    loader.load().await
}

async fn assume_role(base: &SdkConfig, role: &RoleTarget) -> AuditResult<SdkConfig> {
    let sts = aws_sdk_sts::Client::new(base);
    let arn = role.arn();
    info!(role_arn = %arn, "assuming role");

    let output = sts
        .assume_role()
        .role_arn(&arn)
        .role_session_name(role_session_name())
        .send()
        .await
        .map_err(|e| {
            AuditError::CredentialResolution(format!(
                "the base credentials could not assume {}: {}",
                arn,
                DisplayErrorContext(e)
            ))
        })?;

    let creds = output.credentials().ok_or_else(|| {
        AuditError::CredentialResolution(format!("AssumeRole for {} returned no credentials", arn))
    })?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).credentials_provider(
        Credentials::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            Some(creds.session_token().to_string()),
            None,
            "awsklean-assumed-role",
        ),
    );
    if let Some(region) = base.region().cloned() {
        loader = loader.region(region);
    }

    Ok(loader.load().await)
}

async fn verify_session(config: &SdkConfig) -> AuditResult<()> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| AuditError::CredentialResolution(DisplayErrorContext(e).to_string()))?;
    debug!(arn = ?identity.arn(), "session verified");
    Ok(())
}
