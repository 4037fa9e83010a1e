//! Super-user exclusion list.
//!
//! Users on this list are never classified or remediated. The list is read
//! from a local JSON cache; when the cache is missing it is downloaded once,
//! written to the cache path and read back.
//!
//! ```json
//! { "superUsers": ["root-admin", "break-glass"] }
//! ```

use crate::error::{AuditError, AuditResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Usernames that must never be acted upon.
pub type ExclusionSet = HashSet<String>;

pub const DEFAULT_SUPER_USERS_URL: &str =
    "https://raw.githubusercontent.com/awsklean/awsklean/master/super_users.json";
pub const DEFAULT_SUPER_USERS_CACHE: &str = "awsklean_super_users.json";
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ExclusionDocument {
    #[serde(rename = "superUsers")]
    super_users: Vec<String>,
}

/// Parse an exclusion document. Keys other than `superUsers` are ignored.
pub fn parse_exclusion_document(contents: &str) -> Result<ExclusionSet> {
    let doc: ExclusionDocument =
        serde_json::from_str(contents).context("Failed to parse super user list")?;
    Ok(doc
        .super_users
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect())
}

/// Read and parse the local cache file.
pub fn load_exclusion_file(path: &Path) -> Result<ExclusionSet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read super user list: {}", path.display()))?;
    parse_exclusion_document(&contents)
}

/// Resolves the exclusion set from the local cache or the remote URL.
#[derive(Debug, Clone)]
pub struct ExclusionResolver {
    cache_path: PathBuf,
    remote_url: String,
    force_refresh: bool,
    timeout: Duration,
}

impl ExclusionResolver {
    pub fn new(cache_path: impl Into<PathBuf>, remote_url: impl Into<String>) -> Self {
        Self {
            cache_path: cache_path.into(),
            remote_url: remote_url.into(),
            force_refresh: false,
            timeout: DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from CLI options.
    ///
    /// An explicitly supplied URL discards any cached copy so the list is
    /// downloaded again.
    pub fn from_options(cache_path: Option<&str>, override_url: Option<&str>) -> Self {
        let mut resolver = Self::new(
            cache_path.unwrap_or(DEFAULT_SUPER_USERS_CACHE),
            override_url.unwrap_or(DEFAULT_SUPER_USERS_URL),
        );
        resolver.force_refresh = override_url.is_some();
        resolver
    }

    pub async fn resolve(&self) -> AuditResult<ExclusionSet> {
        if self.force_refresh {
            if self.cache_path.exists() {
                debug!(path = %self.cache_path.display(), "discarding cached super user list");
                if let Err(e) = fs::remove_file(&self.cache_path) {
                    warn!(path = %self.cache_path.display(), error = %e, "could not remove cached super user list");
                }
            }
        } else {
            match load_exclusion_file(&self.cache_path) {
                Ok(set) => {
                    debug!(count = set.len(), "loaded super user list from cache");
                    return Ok(set);
                }
                Err(e) => debug!("{:#}", e),
            }
        }

        info!(url = %self.remote_url, "downloading super user list");
        self.download()
            .await
            .map_err(|e| AuditError::ConfigurationMissing(format!("{:#}", e)))?;

        load_exclusion_file(&self.cache_path)
            .map_err(|e| AuditError::ConfigurationMissing(format!("{:#}", e)))
    }

    async fn download(&self) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(&self.remote_url)
            .send()
            .await
            .with_context(|| format!("Failed to download super user list from {}", self.remote_url))?
            .error_for_status()
            .context("Super user list download was rejected")?;

        let body = response
            .text()
            .await
            .context("Failed to read super user list response")?;

        fs::write(&self.cache_path, body).with_context(|| {
            format!(
                "Failed to write super user list cache: {}",
                self.cache_path.display()
            )
        })
    }
}
