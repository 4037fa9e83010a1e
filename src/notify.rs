//! Slack-style webhook notifications.
//!
//! Delivery is best effort: callers go through [`notify_best_effort`], which
//! logs failures and never returns them.

use crate::error::{AuditError, AuditResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

pub const WEBHOOK_ENV: &str = "AWSKLEAN_SLACK_WEBHOOK";
pub const NOTIFIER_ICON_URL: &str =
    "https://www.freeiconspng.com/uploads/black-key-symbol-icon-6.png";
pub const NOTIFIER_USERNAME: &str = "AWSKlean";
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> AuditResult<()>;
}

/// Send a message, logging and discarding any failure.
pub async fn notify_best_effort<N: Notifier + ?Sized>(notifier: &N, message: &str) {
    if let Err(e) = notifier.notify(message).await {
        warn!("{}", e);
    }
}

/// Webhook payload
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookMessage<'a> {
    pub text: &'a str,
    pub icon_url: &'a str,
    pub username: &'a str,
}

impl<'a> WebhookMessage<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            icon_url: NOTIFIER_ICON_URL,
            username: NOTIFIER_USERNAME,
        }
    }
}

/// Posts messages to an incoming webhook
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> AuditResult<Self> {
        Self::with_timeout(webhook_url, WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(webhook_url: String, timeout: Duration) -> AuditResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::NotificationFailure(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            webhook_url,
            client,
        })
    }

    /// Build from `AWSKLEAN_SLACK_WEBHOOK`.
    ///
    /// Fails with [`AuditError::WebhookNotConfigured`] when the variable is
    /// unset or empty.
    pub fn from_env() -> AuditResult<Self> {
        match env::var(WEBHOOK_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim().to_string()),
            _ => Err(AuditError::WebhookNotConfigured),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) -> AuditResult<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookMessage::new(message))
            .send()
            .await
            .map_err(|e| AuditError::NotificationFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::NotificationFailure(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        debug!("notification delivered");
        Ok(())
    }
}

/// Notifier used when notifications are turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _message: &str) -> AuditResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _message: &str) -> AuditResult<()> {
            Err(AuditError::NotificationFailure("unreachable".into()))
        }
    }

    #[test]
    fn test_webhook_payload() {
        let payload = serde_json::to_value(WebhookMessage::new("key deleted")).unwrap();
        assert_eq!(payload["text"], "key deleted");
        assert_eq!(payload["username"], "AWSKlean");
        assert_eq!(payload["icon_url"], NOTIFIER_ICON_URL);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        notify_best_effort(&FailingNotifier, "hello").await;
        notify_best_effort(&NoopNotifier, "hello").await;
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_an_error() {
        let notifier = SlackNotifier::new("http://127.0.0.1:9/hook".to_string()).unwrap();
        let err = notifier.notify("hello").await.unwrap_err();
        assert!(matches!(err, AuditError::NotificationFailure(_)));
        assert!(!err.is_fatal());
    }
}
