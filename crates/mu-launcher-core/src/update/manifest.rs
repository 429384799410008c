//! Update manifest fetching and version comparison.

use crate::config::NetworkConfig;
use crate::error::{LauncherError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, warn};

/// Remote description of the latest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    #[serde(default)]
    pub zip_url: String,
    /// Hex SHA-256 of the archive; empty skips verification.
    #[serde(default)]
    pub sha256: String,
}

/// Manifest location under `update_url`, or `None` when no URL is configured.
pub fn manifest_url(update_url: &str) -> Option<String> {
    let base = update_url.trim();
    if base.is_empty() {
        return None;
    }
    let separator = if base.ends_with('/') { "" } else { "/" };
    Some(format!(
        "{}{}{}",
        base,
        separator,
        NetworkConfig::MANIFEST_FILE_NAME
    ))
}

/// Whether `remote` is newer than `current`.
///
/// Versions may carry a leading `v`. Semver is tried first; otherwise the
/// first three dot-separated numbers are compared; otherwise the raw strings.
pub fn is_newer_version(remote: &str, current: &str) -> bool {
    let remote_trimmed = remote.trim().trim_start_matches(['v', 'V']);
    let current_trimmed = current.trim().trim_start_matches(['v', 'V']);

    if let (Ok(r), Ok(c)) = (
        semver::Version::parse(remote_trimmed),
        semver::Version::parse(current_trimmed),
    ) {
        return r > c;
    }

    match (numeric_parts(remote_trimmed), numeric_parts(current_trimmed)) {
        (Some(r), Some(c)) => r.cmp(&c) == Ordering::Greater,
        _ => remote > current,
    }
}

fn numeric_parts(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .take(3)
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Fetch and parse the manifest, retrying transient network failures.
pub async fn fetch_manifest(client: &reqwest::Client, url: &str) -> Result<UpdateManifest> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetch_once(client, url).await {
            Ok(manifest) => return Ok(manifest),
            Err(e) if e.is_retryable() && attempt < NetworkConfig::MAX_RETRIES => {
                warn!("Manifest fetch attempt {} failed: {}", attempt, e);
                tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<UpdateManifest> {
    debug!("Checking for updates at: {}", url);
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(LauncherError::Network {
            message: format!("Manifest request returned HTTP {}", response.status()),
            cause: None,
        });
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| LauncherError::Json {
        message: format!("Invalid manifest JSON: {}", e),
        source: Some(e),
    })
}
