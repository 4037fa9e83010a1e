//! IAM API client.
//!
//! [`IdentityProvider`] is the seam between the audit logic and AWS. The
//! production implementation, [`AwsIamClient`], wraps the AWS SDK clients
//! built by [`crate::session`].

use crate::error::{AuditError, AuditResult};
use async_trait::async_trait;
use aws_sdk_iam::types::StatusType;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info};

/// Seconds to wait for IAM to finish generating the credential report
pub const REPORT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Label used when neither an alias nor an account id can be resolved
pub const UNKNOWN_ACCOUNT_LABEL: &str = "N/A - GET ACC FAIL";

/// Access key metadata as returned by `ListAccessKeys`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyInfo {
    pub access_key_id: String,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
}

/// Outcome of a single credential report download attempt
#[derive(Debug)]
pub enum ReportFetch {
    Ready(String),
    NotReady,
}

/// Operations the audit needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Request generation of a fresh credential report.
    async fn generate_credential_report(&self) -> AuditResult<()>;

    /// Download the credential report as CSV text.
    async fn get_credential_report(&self) -> AuditResult<ReportFetch>;

    /// Delete the user's console login profile.
    async fn revoke_password(&self, user: &str) -> AuditResult<()>;

    async fn list_access_keys(&self, user: &str) -> AuditResult<Vec<AccessKeyInfo>>;

    async fn set_access_key_inactive(&self, user: &str, access_key_id: &str) -> AuditResult<()>;

    async fn delete_access_key(&self, user: &str, access_key_id: &str) -> AuditResult<()>;

    /// Account alias, falling back to the account id.
    async fn account_label(&self) -> String;
}

/// Generate and fetch the credential report.
///
/// If IAM is still generating the report, waits `retry_delay` once and
/// tries again before giving up with [`AuditError::ReportNotReady`].
pub async fn fetch_credential_report<P: IdentityProvider + ?Sized>(
    provider: &P,
    retry_delay: Duration,
) -> AuditResult<String> {
    provider.generate_credential_report().await?;

    match provider.get_credential_report().await? {
        ReportFetch::Ready(content) => return Ok(content),
        ReportFetch::NotReady => {}
    }

    let spinner = crate::utils::progress::ProgressBar::new_spinner(&format!(
        "Gathering information for all users, this takes about {} seconds",
        retry_delay.as_secs()
    ));
    tokio::time::sleep(retry_delay).await;
    spinner.finish_and_clear();

    match provider.get_credential_report().await? {
        ReportFetch::Ready(content) => Ok(content),
        ReportFetch::NotReady => Err(AuditError::ReportNotReady),
    }
}

/// IAM client backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct AwsIamClient {
    iam: aws_sdk_iam::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsIamClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            iam: aws_sdk_iam::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
        }
    }

    async fn account_alias(&self) -> AuditResult<Option<String>> {
        let output = self
            .iam
            .list_account_aliases()
            .send()
            .await
            .map_err(|e| AuditError::provider("ListAccountAliases", e.into_service_error()))?;
        Ok(output.account_aliases().first().cloned())
    }

    async fn caller_account_id(&self) -> AuditResult<String> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| AuditError::provider("GetCallerIdentity", e.into_service_error()))?;
        output
            .account()
            .map(ToString::to_string)
            .ok_or_else(|| AuditError::provider("GetCallerIdentity", "response has no account"))
    }
}

#[async_trait]
impl IdentityProvider for AwsIamClient {
    async fn generate_credential_report(&self) -> AuditResult<()> {
        let output = self
            .iam
            .generate_credential_report()
            .send()
            .await
            .map_err(|e| {
                AuditError::provider("GenerateCredentialReport", e.into_service_error())
            })?;
        debug!(state = ?output.state(), "credential report generation requested");
        Ok(())
    }

    async fn get_credential_report(&self) -> AuditResult<ReportFetch> {
        match self.iam.get_credential_report().send().await {
            Ok(output) => {
                let bytes = output
                    .content()
                    .map(|blob| blob.as_ref().to_vec())
                    .unwrap_or_default();
                let content = String::from_utf8(bytes).map_err(|e| {
                    AuditError::provider("GetCredentialReport", format!("report is not UTF-8: {e}"))
                })?;
                Ok(ReportFetch::Ready(content))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_credential_report_not_ready_exception() {
                    Ok(ReportFetch::NotReady)
                } else {
                    Err(AuditError::provider("GetCredentialReport", service_err))
                }
            }
        }
    }

    async fn revoke_password(&self, user: &str) -> AuditResult<()> {
        self.iam
            .delete_login_profile()
            .user_name(user)
            .send()
            .await
            .map_err(|e| AuditError::provider("DeleteLoginProfile", e.into_service_error()))?;
        info!(user, "login profile deleted");
        Ok(())
    }

    async fn list_access_keys(&self, user: &str) -> AuditResult<Vec<AccessKeyInfo>> {
        let output = self
            .iam
            .list_access_keys()
            .user_name(user)
            .send()
            .await
            .map_err(|e| AuditError::provider("ListAccessKeys", e.into_service_error()))?;

        Ok(output
            .access_key_metadata()
            .iter()
            .filter_map(|meta| {
                let access_key_id = meta.access_key_id()?.to_string();
                Some(AccessKeyInfo {
                    access_key_id,
                    active: matches!(meta.status(), Some(StatusType::Active)),
                    created: meta
                        .create_date()
                        .and_then(|d| DateTime::<Utc>::from_timestamp(d.secs(), d.subsec_nanos())),
                })
            })
            .collect())
    }

    async fn set_access_key_inactive(&self, user: &str, access_key_id: &str) -> AuditResult<()> {
        self.iam
            .update_access_key()
            .user_name(user)
            .access_key_id(access_key_id)
            .status(StatusType::Inactive)
            .send()
            .await
            .map_err(|e| AuditError::provider("UpdateAccessKey", e.into_service_error()))?;
        info!(user, access_key_id, "access key deactivated");
        Ok(())
    }

    async fn delete_access_key(&self, user: &str, access_key_id: &str) -> AuditResult<()> {
        self.iam
            .delete_access_key()
            .user_name(user)
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| AuditError::provider("DeleteAccessKey", e.into_service_error()))?;
        info!(user, access_key_id, "access key deleted");
        Ok(())
    }

    async fn account_label(&self) -> String {
        match self.account_alias().await {
            Ok(Some(alias)) => return alias,
            Ok(None) => debug!("account has no alias, falling back to account id"),
            Err(e) => debug!("{}", e),
        }

        match self.caller_account_id().await {
            Ok(id) => id,
            Err(e) => {
                debug!("{}", e);
                UNKNOWN_ACCOUNT_LABEL.to_string()
            }
        }
    }
}

/// Order keys oldest first so that position 0 is access key 1.
pub fn order_access_keys(mut keys: Vec<AccessKeyInfo>) -> Vec<AccessKeyInfo> {
    // Stable sort keeps the API order for keys without a creation date.
    keys.sort_by_key(|k| k.created.unwrap_or(DateTime::<Utc>::MAX_UTC));
    keys
}
