//! Error taxonomy for credential auditing.
//!
//! Configuration and credential problems are fatal and carry a hint that the
//! binary prints before exiting. Per-row and per-item problems are absorbed
//! where they happen and only ever show up in logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The super-user list could not be loaded from the cache or the remote URL.
    #[error("exclusion list unavailable: {0}")]
    ConfigurationMissing(String),

    /// The requested profile, key pair or role did not produce a usable session.
    #[error("unable to resolve AWS credentials: {0}")]
    CredentialResolution(String),

    /// The credential report was still being generated after the retry.
    #[error("credential report is still being generated")]
    ReportNotReady,

    /// A single report line did not have the expected shape.
    #[error("malformed report row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// A flagged access key no longer exists for the user.
    #[error("user {user} has no access key at position {index}")]
    MissingKeyMetadata { user: String, index: usize },

    /// Notification mode was requested but no webhook is configured.
    #[error("AWSKLEAN_SLACK_WEBHOOK is not set")]
    WebhookNotConfigured,

    /// Delivery to the webhook failed.
    #[error("notification failed: {0}")]
    NotificationFailure(String),

    /// An identity provider call failed.
    #[error("{operation} failed: {message}")]
    Provider { operation: String, message: String },
}

impl AuditError {
    pub fn provider(operation: &str, err: impl std::fmt::Display) -> Self {
        AuditError::Provider {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    /// Human-readable remediation hint printed for fatal errors.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AuditError::ConfigurationMissing(_) => Some(
                "Provide a super-user list with --super-users-url (or AWSKLEAN_SUPER_USERS_URL),\n\
                 or place a JSON file of the form {\"superUsers\": [...]} at the cache path.",
            ),
            AuditError::CredentialResolution(_) => Some(
                "Check the credential source:\n\
                 - Profile: the name must exist in ~/.aws/credentials or ~/.aws/config\n\
                 - Key pair: pass both --aws-key-id and --aws-secret\n\
                 - Role: pass --role \"<ACCOUNT_NUMBER>,<ROLE_NAME>\" and make sure the base\n\
                   credentials are allowed to call sts:AssumeRole\n\
                 - Jenkins: pass --jenkins-profile with a configured profile name",
            ),
            AuditError::ReportNotReady => {
                Some("AWS is still generating the credential report. Try again in a few minutes.")
            }
            AuditError::WebhookNotConfigured => Some(
                "Set AWSKLEAN_SLACK_WEBHOOK to an incoming webhook URL before passing --notify-slack.",
            ),
            AuditError::Provider { .. } => {
                Some("Make sure the credentials in use have the required IAM permissions.")
            }
            _ => None,
        }
    }

    /// Whether this error must stop the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AuditError::MalformedRow { .. }
                | AuditError::MissingKeyMetadata { .. }
                | AuditError::NotificationFailure(_)
        )
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
