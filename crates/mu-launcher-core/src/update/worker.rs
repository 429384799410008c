//! Download, verify and install one update archive.

use crate::cancel::CancellationToken;
use crate::config::{NetworkConfig, PathsConfig};
use crate::error::{LauncherError, Result};
use crate::events::{EventBus, LauncherEvent};
use crate::update::UpdateManifest;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const ARCHIVE_NAME: &str = "update.zip";
const STAGING_DIR_NAME: &str = "staging";

/// Applies one manifest to the launcher root.
pub struct UpdateWorker {
    client: reqwest::Client,
    manifest: UpdateManifest,
    base_path: PathBuf,
    events: EventBus,
    token: CancellationToken,
}

impl UpdateWorker {
    pub fn new(
        client: reqwest::Client,
        manifest: UpdateManifest,
        base_path: impl Into<PathBuf>,
        events: EventBus,
        token: CancellationToken,
    ) -> Self {
        Self {
            client,
            manifest,
            base_path: base_path.into(),
            events,
            token,
        }
    }

    fn temp_dir(&self) -> PathBuf {
        self.base_path.join(PathsConfig::UPDATE_TEMP_DIR_NAME)
    }

    /// Download the archive and install it. The temp directory is removed
    /// whatever the outcome.
    pub async fn run(&self) -> Result<()> {
        if self.manifest.zip_url.trim().is_empty() {
            return Err(LauncherError::Other("No zip_url in manifest".into()));
        }

        info!("Downloading update {} from {}", self.manifest.version, self.manifest.zip_url);
        let result = async {
            let response = self
                .client
                .get(&self.manifest.zip_url)
                .timeout(NetworkConfig::DOWNLOAD_REQUEST_TIMEOUT)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(LauncherError::Network {
                    message: format!("Download failed: HTTP {}", response.status()),
                    cause: None,
                });
            }
            let total = response.content_length();
            self.install_from_stream(response.bytes_stream(), total).await
        }
        .await;

        self.cleanup();
        result
    }

    /// Consume an archive byte stream, verify it and install it.
    ///
    /// Cancellation is checked before every chunk. Nothing reaches the
    /// launcher root unless the archive is complete, verified and extracted.
    pub async fn install_from_stream<S, B, E>(&self, stream: S, total: Option<u64>) -> Result<()>
    where
        S: Stream<Item = std::result::Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        let temp_dir = self.temp_dir();
        let result = self.install_inner(stream, total, &temp_dir).await;
        if result.is_err() {
            self.cleanup();
        }
        result
    }

    async fn install_inner<S, B, E>(&self, mut stream: S, total: Option<u64>, temp_dir: &Path) -> Result<()>
    where
        S: Stream<Item = std::result::Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        fs::create_dir_all(temp_dir).map_err(|e| LauncherError::io_with_path(e, temp_dir))?;
        let archive_path = temp_dir.join(ARCHIVE_NAME);
        let part_path = temp_dir.join(format!("{}{}", ARCHIVE_NAME, NetworkConfig::DOWNLOAD_TEMP_SUFFIX));

        let mut file = File::create(&part_path).map_err(|e| LauncherError::io_with_path(e, &part_path))?;
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut last_percent: Option<u8> = None;

        while let Some(chunk) = stream.next().await {
            self.token.check()?;

            let chunk = chunk.map_err(|e| LauncherError::Network {
                message: format!("Download failed: {}", e),
                cause: Some(e.to_string()),
            })?;
            let bytes = chunk.as_ref();
            file.write_all(bytes)
                .map_err(|e| LauncherError::io_with_path(e, &part_path))?;
            hasher.update(bytes);
            downloaded += bytes.len() as u64;

            let percent = match total {
                Some(total) if total > 0 => ((downloaded.min(total) * 100) / total) as u8,
                _ => 50,
            };
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                self.events.emit(LauncherEvent::DownloadProgress { percent });
            }
        }
        self.token.check()?;
        file.sync_all()
            .map_err(|e| LauncherError::io_with_path(e, &part_path))?;
        drop(file);
        fs::rename(&part_path, &archive_path)
            .map_err(|e| LauncherError::io_with_path(e, &archive_path))?;
        debug!("Downloaded {} bytes to {}", downloaded, archive_path.display());

        let expected = self.manifest.sha256.trim();
        if !expected.is_empty() {
            self.events.emit(LauncherEvent::DownloadProgress { percent: 95 });
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::HashMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        self.events.emit(LauncherEvent::DownloadProgress { percent: 98 });
        let staging = temp_dir.join(STAGING_DIR_NAME);
        let base = self.base_path.clone();
        let token = self.token.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            extract_zip(&archive_path, &staging)?;
            token.check()?;
            install_staged(&staging, &base)
        })
        .await
        .map_err(|e| LauncherError::Other(format!("Extraction task failed: {}", e)))??;

        self.events.emit(LauncherEvent::DownloadProgress { percent: 100 });
        info!("Update {} installed into {}", self.manifest.version, self.base_path.display());
        Ok(())
    }

    fn cleanup(&self) {
        let temp_dir = self.temp_dir();
        if temp_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&temp_dir) {
                warn!("Failed to remove {}: {}", temp_dir.display(), e);
            }
        }
    }
}

/// Extract a zip archive, skipping entries that would escape `extract_dir`.
pub fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| LauncherError::io_with_path(e, archive_path))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| LauncherError::Archive {
        message: format!("Invalid or corrupted zip file: {}", e),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry {}", entry.name());
            continue;
        };
        let outpath = extract_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| LauncherError::io_with_path(e, &outpath))?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| LauncherError::io_with_path(e, parent))?;
        }
        let mut outfile = File::create(&outpath).map_err(|e| LauncherError::io_with_path(e, &outpath))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| LauncherError::io_with_path(e, &outpath))?;
    }
    Ok(())
}

/// Move every file under `staging` to the same relative path under `base`.
fn install_staged(staging: &Path, base: &Path) -> Result<()> {
    for entry in WalkDir::new(staging).min_depth(1) {
        let entry = entry.map_err(|e| LauncherError::Io {
            message: e.to_string(),
            path: e.path().map(Path::to_path_buf),
            source: None,
        })?;
        let relative = entry
            .path()
            .strip_prefix(staging)
            .map_err(|e| LauncherError::Other(e.to_string()))?;
        let target = base.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| LauncherError::io_with_path(e, &target))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| LauncherError::io_with_path(e, parent))?;
        }
        if fs::rename(entry.path(), &target).is_err() {
            // Cross-device or locked target: fall back to copying
            fs::copy(entry.path(), &target).map_err(|e| LauncherError::io_with_path(e, &target))?;
        }
    }
    Ok(())
}
