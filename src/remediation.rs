//! Remediation of stale credentials.
//!
//! For every method classified `Unused` or `Stale`, the remediator revokes
//! the password or deactivates/deletes the access key. In dry-run mode the
//! intended action is logged and nothing reaches the provider.
//!
//! Per-item failures (a key that vanished, a rejected API call, an
//! unreachable webhook) are logged and recorded in the outcome; they never
//! stop the remaining work.

use crate::context::RunContext;
use crate::error::AuditError;
use crate::iam_api::{order_access_keys, AccessKeyInfo, IdentityProvider};
use crate::notify::{notify_best_effort, Notifier};
use crate::policy::VerdictSet;
use crate::report::types::AccessMethod;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// What to do with a stale access key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Deactivate,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationAction {
    RevokePassword,
    DeactivateKey,
    DeleteKey,
}

impl RemediationAction {
    fn past_tense(self) -> &'static str {
        match self {
            RemediationAction::RevokePassword => "revoked",
            RemediationAction::DeactivateKey => "deactivated",
            RemediationAction::DeleteKey => "deleted",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            RemediationAction::RevokePassword => "revoke",
            RemediationAction::DeactivateKey => "deactivate",
            RemediationAction::DeleteKey => "delete",
        }
    }
}

impl From<KeyAction> for RemediationAction {
    fn from(action: KeyAction) -> Self {
        match action {
            KeyAction::Deactivate => RemediationAction::DeactivateKey,
            KeyAction::Delete => RemediationAction::DeleteKey,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ActionStatus {
    Applied,
    DryRun,
    Skipped(String),
    Failed(String),
}

/// One attempted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub username: String,
    pub method: AccessMethod,
    pub action: RemediationAction,
    pub access_key_id: Option<String>,
    pub status: ActionStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemediationOutcome {
    pub records: Vec<ActionRecord>,
}

impl RemediationOutcome {
    fn count(&self, pred: impl Fn(&ActionStatus) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.status)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, ActionStatus::Applied))
    }

    pub fn dry_run(&self) -> usize {
        self.count(|s| matches!(s, ActionStatus::DryRun))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ActionStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ActionStatus::Failed(_)))
    }
}

/// Executes remediation against an identity provider.
pub struct Remediator<'a, P: ?Sized, N: ?Sized> {
    provider: &'a P,
    notifier: &'a N,
    ctx: &'a RunContext,
}

impl<'a, P, N> Remediator<'a, P, N>
where
    P: IdentityProvider + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(provider: &'a P, notifier: &'a N, ctx: &'a RunContext) -> Self {
        Self {
            provider,
            notifier,
            ctx,
        }
    }

    /// Deactivate or delete every flagged access key.
    ///
    /// A user's keys are listed once, before any of them is changed, so that
    /// "access key 1" and "access key 2" keep pointing at the same keys while
    /// the user's flagged keys are processed. Passwords are not touched here;
    /// see [`Self::revoke_passwords`].
    pub async fn apply(&self, verdicts: &VerdictSet, action: KeyAction) -> RemediationOutcome {
        let mut outcome = RemediationOutcome::default();

        for (username, user) in verdicts {
            let methods: Vec<AccessMethod> = user
                .candidates()
                .into_iter()
                .filter(|m| m.key_index().is_some())
                .collect();
            if methods.is_empty() {
                continue;
            }

            if self.ctx.dry_run {
                for method in methods {
                    let record = self.dry_run_key(username, method, action).await;
                    outcome.records.push(record);
                }
                continue;
            }

            let keys = match self.provider.list_access_keys(username).await {
                Ok(keys) => order_access_keys(keys),
                Err(e) => {
                    error!(user = username.as_str(), "{}", e);
                    for method in methods {
                        outcome.records.push(ActionRecord {
                            username: username.clone(),
                            method,
                            action: action.into(),
                            access_key_id: None,
                            status: ActionStatus::Failed(e.to_string()),
                        });
                    }
                    continue;
                }
            };

            for method in methods {
                let record = self.remediate_key(username, method, &keys, action).await;
                outcome.records.push(record);
            }
        }

        outcome
    }

    /// Revoke console access for every flagged password.
    pub async fn revoke_passwords(&self, verdicts: &VerdictSet) -> RemediationOutcome {
        let mut outcome = RemediationOutcome::default();

        for (username, user) in verdicts {
            if !user.password.is_candidate() {
                continue;
            }
            let record = self.revoke_password(username).await;
            outcome.records.push(record);
        }

        outcome
    }

    async fn revoke_password(&self, username: &str) -> ActionRecord {
        let action = RemediationAction::RevokePassword;
        let mut record = ActionRecord {
            username: username.to_string(),
            method: AccessMethod::Password,
            action,
            access_key_id: None,
            status: ActionStatus::DryRun,
        };

        if self.ctx.dry_run {
            info!("[DRY RUN] would revoke password for {}", username);
            self.send(&record).await;
            return record;
        }

        record.status = match self.provider.revoke_password(username).await {
            Ok(()) => ActionStatus::Applied,
            Err(e) => {
                error!(user = username, "{}", e);
                ActionStatus::Failed(e.to_string())
            }
        };
        if record.status == ActionStatus::Applied {
            self.send(&record).await;
        }
        record
    }

    async fn dry_run_key(
        &self,
        username: &str,
        method: AccessMethod,
        key_action: KeyAction,
    ) -> ActionRecord {
        let action = RemediationAction::from(key_action);
        let record = ActionRecord {
            username: username.to_string(),
            method,
            action,
            access_key_id: None,
            status: ActionStatus::DryRun,
        };
        info!("[DRY RUN] would {} {} for {}", action.verb(), method, username);
        self.send(&record).await;
        record
    }

    /// Act on one flagged key, resolved against the user's key list as it
    /// was before any change.
    async fn remediate_key(
        &self,
        username: &str,
        method: AccessMethod,
        keys: &[AccessKeyInfo],
        key_action: KeyAction,
    ) -> ActionRecord {
        let mut record = ActionRecord {
            username: username.to_string(),
            method,
            action: RemediationAction::from(key_action),
            access_key_id: None,
            status: ActionStatus::Applied,
        };

        let Some(key) = method.key_index().and_then(|index| keys.get(index)) else {
            let err = AuditError::MissingKeyMetadata {
                user: username.to_string(),
                index: method.key_index().map_or(0, |i| i + 1),
            };
            warn!("{}, skipping", err);
            record.status = ActionStatus::Skipped(err.to_string());
            return record;
        };
        record.access_key_id = Some(key.access_key_id.clone());

        if key_action == KeyAction::Deactivate && !key.active {
            debug!(user = username, access_key_id = %key.access_key_id, "access key already inactive");
            record.status = ActionStatus::Skipped("already inactive".to_string());
            return record;
        }

        let result = match key_action {
            KeyAction::Deactivate => {
                self.provider
                    .set_access_key_inactive(username, &key.access_key_id)
                    .await
            }
            KeyAction::Delete => {
                self.provider
                    .delete_access_key(username, &key.access_key_id)
                    .await
            }
        };

        if let Err(e) = result {
            error!(user = username, access_key_id = %key.access_key_id, "{}", e);
            record.status = ActionStatus::Failed(e.to_string());
            return record;
        }
        self.send(&record).await;
        record
    }

    async fn send(&self, record: &ActionRecord) {
        if self.ctx.notify {
            let message = notification_message(&self.ctx.account_label, record);
            notify_best_effort(self.notifier, &message).await;
        }
    }
}

/// Human-readable notification text for an action record
pub fn notification_message(account_label: &str, record: &ActionRecord) -> String {
    let target = match &record.access_key_id {
        Some(id) => format!("{} ({})", record.method, id),
        None => record.method.to_string(),
    };

    match record.status {
        ActionStatus::DryRun => format!(
            "[DRY RUN] AWSKlean would {} {} for user {} in account {}",
            record.action.verb(),
            target,
            record.username,
            account_label
        ),
        _ => format!(
            "AWSKlean {} {} for user {} in account {}",
            record.action.past_tense(),
            target,
            record.username,
            account_label
        ),
    }
}
