/// Remediation against the in-memory provider: dry runs, key selection,
/// per-item failures and notifications.
mod common;

use awsklean::context::RunContext;
use awsklean::exclusion::ExclusionSet;
use awsklean::policy::{classify, VerdictSet};
use awsklean::remediation::{ActionStatus, KeyAction, RemediationAction, Remediator};
use awsklean::report::parser::parse_report;
use awsklean::report::types::AccessMethod;
use chrono::{TimeZone, Utc};
use common::{now, report, report_row, scenario_report, Call, MockProvider, RecordingNotifier};

fn verdicts() -> VerdictSet {
    let parsed = parse_report(&scenario_report());
    classify(&parsed.rows, &ExclusionSet::new(), 60, now())
}

fn ctx(dry_run: bool, notify: bool) -> RunContext {
    RunContext::new(dry_run, notify, "test-account".to_string()).with_now(now())
}

/// alice has two keys registered newest first; root has a single key
fn provider() -> MockProvider {
    MockProvider::default()
        .add_key(
            "alice",
            "AKIAALICENEW",
            Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
        )
        .add_key(
            "alice",
            "AKIAALICEOLD",
            Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap(),
        )
        .add_key(
            "root",
            "AKIAROOT",
            Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap(),
        )
}

#[tokio::test]
async fn test_dry_run_makes_no_provider_calls() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(true, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let keys = remediator.apply(&verdicts(), KeyAction::Delete).await;
    let passwords = remediator.revoke_passwords(&verdicts()).await;

    assert!(provider.calls().is_empty());
    assert!(notifier.messages().is_empty());

    // alice key 1, root key 1, root key 2
    assert_eq!(keys.records.len(), 3);
    assert_eq!(keys.dry_run(), 3);
    // alice (never used) and root (stale)
    assert_eq!(passwords.records.len(), 2);
    assert!(passwords
        .records
        .iter()
        .all(|r| r.status == ActionStatus::DryRun));
}

#[tokio::test]
async fn test_deactivate_targets_keys_by_creation_order() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts(), KeyAction::Deactivate).await;

    let alice = &outcome.records[0];
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.method, AccessMethod::AccessKey1);
    assert_eq!(alice.action, RemediationAction::DeactivateKey);
    assert_eq!(alice.access_key_id.as_deref(), Some("AKIAALICEOLD"));
    assert_eq!(alice.status, ActionStatus::Applied);

    let alice_keys = provider.keys_for("alice");
    let old = alice_keys
        .iter()
        .find(|k| k.access_key_id == "AKIAALICEOLD")
        .unwrap();
    let new = alice_keys
        .iter()
        .find(|k| k.access_key_id == "AKIAALICENEW")
        .unwrap();
    assert!(!old.active);
    assert!(new.active);
}

#[tokio::test]
async fn test_delete_removes_only_flagged_keys() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts(), KeyAction::Delete).await;

    assert_eq!(outcome.applied(), 2);
    assert_eq!(
        provider.mutating_calls(),
        vec![
            Call::DeleteKey("alice".into(), "AKIAALICEOLD".into()),
            Call::DeleteKey("root".into(), "AKIAROOT".into()),
        ]
    );
    let remaining: Vec<_> = provider
        .keys_for("alice")
        .into_iter()
        .map(|k| k.access_key_id)
        .collect();
    assert_eq!(remaining, vec!["AKIAALICENEW".to_string()]);
    assert!(provider.keys_for("root").is_empty());
}

#[tokio::test]
async fn test_missing_key_is_skipped_and_run_continues() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts(), KeyAction::Deactivate).await;

    // root key 2 is flagged but root only has one key
    let root_key_2 = outcome
        .records
        .iter()
        .find(|r| r.username == "root" && r.method == AccessMethod::AccessKey2)
        .unwrap();
    assert!(matches!(root_key_2.status, ActionStatus::Skipped(_)));
    assert_eq!(root_key_2.access_key_id, None);

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.applied(), 2);
    assert_eq!(outcome.skipped(), 1);
}

#[tokio::test]
async fn test_provider_failure_does_not_stop_remaining_work() {
    let provider = provider().fail_for("alice");
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, true);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts(), KeyAction::Delete).await;

    assert!(matches!(outcome.records[0].status, ActionStatus::Failed(_)));
    assert_eq!(outcome.failed(), 1);
    assert_eq!(outcome.applied(), 1);
    assert!(provider
        .calls()
        .contains(&Call::DeleteKey("root".into(), "AKIAROOT".into())));

    // Only the successful action is announced
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("AKIAROOT"));
}

#[tokio::test]
async fn test_notification_per_applied_action() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, true);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    remediator.apply(&verdicts(), KeyAction::Deactivate).await;

    assert_eq!(
        notifier.messages(),
        vec![
            "AWSKlean deactivated access key 1 (AKIAALICEOLD) for user alice in account test-account"
                .to_string(),
            "AWSKlean deactivated access key 1 (AKIAROOT) for user root in account test-account"
                .to_string(),
        ]
    );
}

#[tokio::test]
async fn test_dry_run_notifications_are_marked() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(true, true);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    remediator.revoke_passwords(&verdicts()).await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.starts_with("[DRY RUN]")));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_failing_notifier_does_not_block_remediation() {
    let provider = provider();
    let notifier = RecordingNotifier::failing();
    let ctx = ctx(false, true);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts(), KeyAction::Delete).await;

    assert_eq!(outcome.applied(), 2);
    assert_eq!(notifier.messages().len(), 2);
    assert!(provider.keys_for("root").is_empty());
}

#[tokio::test]
async fn test_revoke_passwords_only_touches_passwords() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.revoke_passwords(&verdicts()).await;

    assert_eq!(
        provider.calls(),
        vec![
            Call::RevokePassword("alice".into()),
            Call::RevokePassword("root".into()),
        ]
    );
    assert!(outcome
        .records
        .iter()
        .all(|r| r.method == AccessMethod::Password && r.status == ActionStatus::Applied));
    assert_eq!(provider.keys_for("alice").len(), 2);
}

#[tokio::test]
async fn test_key_actions_never_touch_passwords() {
    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts(), KeyAction::Deactivate).await;

    assert!(!provider
        .calls()
        .iter()
        .any(|c| matches!(c, Call::RevokePassword(_))));
    assert!(outcome
        .records
        .iter()
        .all(|r| r.method != AccessMethod::Password));
}

#[tokio::test]
async fn test_excluded_users_are_never_touched() {
    let parsed = parse_report(&scenario_report());
    let exclusions: ExclusionSet = ["root".to_string()].into_iter().collect();
    let verdicts = classify(&parsed.rows, &exclusions, 60, now());

    let provider = provider();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    remediator.apply(&verdicts, KeyAction::Delete).await;
    remediator.revoke_passwords(&verdicts).await;

    assert!(provider.calls().iter().all(|c| match c {
        Call::RevokePassword(u) | Call::ListAccessKeys(u) => u != "root",
        Call::DeactivateKey(u, _) | Call::DeleteKey(u, _) => u != "root",
        _ => true,
    }));
    assert_eq!(provider.keys_for("root").len(), 1);
}

/// dan has two keys, both unused for years
fn dan() -> (VerdictSet, MockProvider) {
    let raw = report(&[report_row(
        "dan",
        ("false", "N/A"),
        ("true", "2020-01-01T00:00:00+00:00"),
        ("true", "2021-01-01T00:00:00+00:00"),
    )]);
    let parsed = parse_report(&raw);
    let verdicts = classify(&parsed.rows, &ExclusionSet::new(), 60, now());

    let provider = MockProvider::default()
        .add_key("dan", "AKIA2", Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap())
        .add_key("dan", "AKIA1", Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap());
    (verdicts, provider)
}

#[tokio::test]
async fn test_delete_both_stale_keys_of_one_user() {
    let (verdicts, provider) = dan();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts, KeyAction::Delete).await;

    assert_eq!(outcome.applied(), 2);
    assert_eq!(outcome.skipped(), 0);
    assert_eq!(outcome.records[0].method, AccessMethod::AccessKey1);
    assert_eq!(outcome.records[0].access_key_id.as_deref(), Some("AKIA1"));
    assert_eq!(outcome.records[1].method, AccessMethod::AccessKey2);
    assert_eq!(outcome.records[1].access_key_id.as_deref(), Some("AKIA2"));
    assert!(provider.keys_for("dan").is_empty());

    // keys are listed once, before anything changes
    assert_eq!(
        provider.calls(),
        vec![
            Call::ListAccessKeys("dan".into()),
            Call::DeleteKey("dan".into(), "AKIA1".into()),
            Call::DeleteKey("dan".into(), "AKIA2".into()),
        ]
    );
}

#[tokio::test]
async fn test_deactivate_both_stale_keys_of_one_user() {
    let (verdicts, provider) = dan();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, false);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    let outcome = remediator.apply(&verdicts, KeyAction::Deactivate).await;

    assert_eq!(outcome.applied(), 2);
    assert!(provider.keys_for("dan").iter().all(|k| !k.active));
}

#[tokio::test]
async fn test_already_inactive_key_is_not_deactivated_again() {
    let (verdicts, provider) = dan();
    let notifier = RecordingNotifier::default();
    let ctx = ctx(false, true);
    let remediator = Remediator::new(&provider, &notifier, &ctx);

    remediator.apply(&verdicts, KeyAction::Deactivate).await;
    let second = remediator.apply(&verdicts, KeyAction::Deactivate).await;

    assert_eq!(second.applied(), 0);
    assert_eq!(second.skipped(), 2);
    assert_eq!(
        provider
            .mutating_calls()
            .iter()
            .filter(|c| matches!(c, Call::DeactivateKey(..)))
            .count(),
        2
    );
    // only the first pass is announced
    assert_eq!(notifier.messages().len(), 2);
}
