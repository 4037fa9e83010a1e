//! Shared fixtures: an in-memory identity provider, a recording notifier,
//! credential report builders and a one-shot HTTP server.
#![allow(dead_code)]

use async_trait::async_trait;
use awsklean::error::{AuditError, AuditResult};
use awsklean::iam_api::{AccessKeyInfo, IdentityProvider, ReportFetch};
use awsklean::notify::Notifier;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const HEADER: &str = "user,arn,user_creation_time,password_enabled,password_last_used,password_last_changed,password_next_rotation,mfa_active,access_key_1_active,access_key_1_last_rotated,access_key_1_last_used_date,access_key_1_last_used_region,access_key_1_last_used_service,access_key_2_active,access_key_2_last_rotated,access_key_2_last_used_date,access_key_2_last_used_region,access_key_2_last_used_service,cert_1_active,cert_1_last_rotated,cert_2_active,cert_2_last_rotated";

/// Fixed "now" used across tests
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// One credential report line in the AWS schema
pub fn report_row(
    user: &str,
    password: (&str, &str),
    key1: (&str, &str),
    key2: (&str, &str),
) -> String {
    format!(
        "{user},arn:aws:iam::123456789012:user/{user},2019-01-01T00:00:00+00:00,{},{},N/A,N/A,false,{},N/A,{},N/A,N/A,{},N/A,{},N/A,N/A,false,N/A,false,N/A",
        password.0, password.1, key1.0, key1.1, key2.0, key2.1
    )
}

pub fn report(rows: &[String]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out
}

/// alice: password never used, key 1 stale, key 2 without usage data.
/// bob: nothing enabled. root: everything ancient.
pub fn scenario_report() -> String {
    report(&[
        report_row(
            "alice",
            ("true", "no_information"),
            ("true", "2024-01-01T00:00:00+00:00"),
            ("true", "N/A"),
        ),
        report_row("bob", ("false", "N/A"), ("false", "N/A"), ("false", "N/A")),
        report_row(
            "root",
            ("true", "2015-01-01T00:00:00+00:00"),
            ("true", "2015-01-01T00:00:00+00:00"),
            ("true", "no_information"),
        ),
        report_row(
            "carol",
            ("true", "2024-05-30T12:00:00+00:00"),
            ("true", "2024-05-31T08:00:00+00:00"),
            ("false", "N/A"),
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GenerateReport,
    GetReport,
    RevokePassword(String),
    ListAccessKeys(String),
    DeactivateKey(String, String),
    DeleteKey(String, String),
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Call::RevokePassword(_) | Call::DeactivateKey(..) | Call::DeleteKey(..)
        )
    }
}

/// In-memory identity provider that records every call
#[derive(Default)]
pub struct MockProvider {
    reports: Mutex<VecDeque<ReportFetch>>,
    keys: Mutex<HashMap<String, Vec<AccessKeyInfo>>>,
    failing_users: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl MockProvider {
    pub fn with_report(content: String) -> Self {
        let provider = Self::default();
        provider
            .reports
            .lock()
            .unwrap()
            .push_back(ReportFetch::Ready(content));
        provider
    }

    /// Queue report responses in order
    pub fn with_reports(responses: Vec<ReportFetch>) -> Self {
        let provider = Self::default();
        provider.reports.lock().unwrap().extend(responses);
        provider
    }

    pub fn add_key(self, user: &str, id: &str, created: DateTime<Utc>) -> Self {
        self.keys
            .lock()
            .unwrap()
            .entry(user.to_string())
            .or_default()
            .push(AccessKeyInfo {
                access_key_id: id.to_string(),
                active: true,
                created: Some(created),
            });
        self
    }

    /// Make every mutating call for `user` fail
    pub fn fail_for(mut self, user: &str) -> Self {
        self.failing_users.insert(user.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn keys_for(&self, user: &str) -> Vec<AccessKeyInfo> {
        self.keys
            .lock()
            .unwrap()
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(&self, operation: &str, user: &str) -> AuditResult<()> {
        if self.failing_users.contains(user) {
            return Err(AuditError::provider(operation, "AccessDenied"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn generate_credential_report(&self) -> AuditResult<()> {
        self.record(Call::GenerateReport);
        Ok(())
    }

    async fn get_credential_report(&self) -> AuditResult<ReportFetch> {
        self.record(Call::GetReport);
        Ok(self
            .reports
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ReportFetch::NotReady))
    }

    async fn revoke_password(&self, user: &str) -> AuditResult<()> {
        self.record(Call::RevokePassword(user.to_string()));
        self.check_failure("DeleteLoginProfile", user)
    }

    async fn list_access_keys(&self, user: &str) -> AuditResult<Vec<AccessKeyInfo>> {
        self.record(Call::ListAccessKeys(user.to_string()));
        Ok(self.keys_for(user))
    }

    async fn set_access_key_inactive(&self, user: &str, access_key_id: &str) -> AuditResult<()> {
        self.record(Call::DeactivateKey(user.to_string(), access_key_id.to_string()));
        self.check_failure("UpdateAccessKey", user)?;
        if let Some(keys) = self.keys.lock().unwrap().get_mut(user) {
            for key in keys.iter_mut().filter(|k| k.access_key_id == access_key_id) {
                key.active = false;
            }
        }
        Ok(())
    }

    async fn delete_access_key(&self, user: &str, access_key_id: &str) -> AuditResult<()> {
        self.record(Call::DeleteKey(user.to_string(), access_key_id.to_string()));
        self.check_failure("DeleteAccessKey", user)?;
        if let Some(keys) = self.keys.lock().unwrap().get_mut(user) {
            keys.retain(|k| k.access_key_id != access_key_id);
        }
        Ok(())
    }

    async fn account_label(&self) -> String {
        "test-account".to_string()
    }
}

/// Notifier that keeps every message, optionally failing each delivery
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> AuditResult<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(AuditError::NotificationFailure("webhook unreachable".into()));
        }
        Ok(())
    }
}

/// Serve exactly one HTTP response on a random local port.
///
/// Returns the base URL and a receiver for the raw request body.
pub async fn serve_once(status: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            request.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let text = String::from_utf8_lossy(&request).to_string();
        let request_body = text
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        let _ = tx.send(request_body);
    });

    (format!("http://{}", addr), rx)
}

/// Accept connections on a random local port and never answer.
pub async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}
