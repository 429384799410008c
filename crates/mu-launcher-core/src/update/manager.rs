//! Update checks and the single in-flight update.

use crate::cancel::CancellationToken;
use crate::config::{AppConfig, NetworkConfig};
use crate::context::LauncherContext;
use crate::error::{LauncherError, Result};
use crate::events::{EventBus, LauncherEvent};
use crate::settings::{keys, SettingsStore};
use crate::update::manifest::{fetch_manifest, is_newer_version, manifest_url, UpdateManifest};
use crate::update::worker::UpdateWorker;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub has_update: bool,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct RunningUpdate {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Checks the update server and runs at most one update at a time.
pub struct UpdateManager {
    client: reqwest::Client,
    base_path: PathBuf,
    settings: Arc<RwLock<SettingsStore>>,
    events: EventBus,
    last_manifest: Mutex<Option<UpdateManifest>>,
    running: Mutex<Option<RunningUpdate>>,
}

impl UpdateManager {
    pub fn new(context: &LauncherContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(AppConfig::USER_AGENT)
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LauncherError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: Some(e.to_string()),
            })?;

        Ok(Self {
            client,
            base_path: context.launcher_root().to_path_buf(),
            settings: context.settings.clone(),
            events: context.events.clone(),
            last_manifest: Mutex::new(None),
            running: Mutex::new(None),
        })
    }

    /// Fetch the manifest and compare against `current_version` (the
    /// `version` setting when `None`). Emits `UpdateAvailable` when newer.
    ///
    /// Failures are reported in [`UpdateCheck::error`] rather than returned.
    pub async fn check_for_updates(&self, current_version: Option<String>) -> UpdateCheck {
        let (stored_version, update_url) = {
            let settings = self.settings.read().await;
            (
                settings.get_or(keys::VERSION, AppConfig::DEFAULT_VERSION.to_string()),
                settings.get_or(keys::UPDATE_URL, String::new()),
            )
        };
        let current_version = current_version.unwrap_or(stored_version);
        let mut check = UpdateCheck {
            has_update: false,
            current_version,
            latest_version: None,
            last_checked: Utc::now(),
            error: None,
        };

        let Some(url) = manifest_url(&update_url) else {
            info!("No update_url configured");
            check.error = Some("No update_url configured".into());
            return check;
        };

        let manifest = match fetch_manifest(&self.client, &url).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Update check failed: {}", e);
                check.error = Some(e.to_string());
                return check;
            }
        };
        check.latest_version = Some(manifest.version.clone());
        check.has_update = !manifest.version.is_empty()
            && is_newer_version(&manifest.version, &check.current_version);

        if check.has_update {
            info!(
                "Update available: {} -> {}",
                check.current_version, manifest.version
            );
            self.events.emit(LauncherEvent::UpdateAvailable {
                version: manifest.version.clone(),
            });
            *lock(&self.last_manifest) = Some(manifest);
        } else {
            info!(
                "No update needed. Current: {}, Remote: {}",
                check.current_version, manifest.version
            );
        }
        check
    }

    /// The manifest remembered by the last check that found an update.
    pub fn last_manifest(&self) -> Option<UpdateManifest> {
        lock(&self.last_manifest).clone()
    }

    pub fn is_updating(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Start downloading and applying `manifest` (or the last found one).
    ///
    /// Returns once the worker is started; progress and completion arrive as
    /// `DownloadProgress`, `UpdateFinished` and `UpdateError` events.
    pub fn download_and_apply(&self, manifest: Option<UpdateManifest>) -> Result<()> {
        let Some(manifest) = manifest.or_else(|| self.last_manifest()) else {
            self.events.emit(LauncherEvent::UpdateError {
                message: LauncherError::NoManifest.to_string(),
            });
            return Err(LauncherError::NoManifest);
        };

        let mut running = lock(&self.running);
        if running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            self.events.emit(LauncherEvent::UpdateError {
                message: LauncherError::UpdateInProgress.to_string(),
            });
            return Err(LauncherError::UpdateInProgress);
        }

        let token = CancellationToken::new();
        let worker = UpdateWorker::new(
            self.client.clone(),
            manifest.clone(),
            self.base_path.clone(),
            self.events.clone(),
            token.clone(),
        );
        let settings = self.settings.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            match worker.run().await {
                Ok(()) => {
                    info!("Update completed successfully");
                    if !manifest.version.is_empty() {
                        if let Err(e) = settings
                            .write()
                            .await
                            .set(keys::VERSION, manifest.version.clone())
                        {
                            warn!("Failed to record version {}: {}", manifest.version, e);
                        }
                    }
                    events.emit(LauncherEvent::UpdateFinished {
                        version: manifest.version,
                    });
                }
                Err(e) => {
                    warn!("Update error: {}", e);
                    events.emit(LauncherEvent::UpdateError {
                        message: e.to_string(),
                    });
                }
            }
        });

        *running = Some(RunningUpdate { token, handle });
        Ok(())
    }

    /// Cancel the running update and wait briefly for it to wind down.
    ///
    /// Returns false when no update was running.
    pub async fn cancel_update(&self) -> bool {
        let Some(running) = lock(&self.running).take() else {
            return false;
        };
        if running.handle.is_finished() {
            return false;
        }

        running.token.cancel();
        match tokio::time::timeout(NetworkConfig::CANCEL_WAIT, running.handle).await {
            Ok(_) => info!("Update cancelled"),
            Err(_) => warn!(
                "Update worker still running {:?} after cancel",
                NetworkConfig::CANCEL_WAIT
            ),
        }
        true
    }

    /// Wait for the running update, if any, to finish.
    pub async fn wait(&self) {
        let running = lock(&self.running).take();
        if let Some(running) = running {
            let _ = running.handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};
    use tempfile::TempDir;

    fn context(update_url: &str) -> (TempDir, LauncherContext) {
        let dir = TempDir::new().unwrap();
        let mut settings = SettingsStore::with_defaults(dir.path().join("config.json"));
        let mut partial = Map::new();
        partial.insert(keys::UPDATE_URL.into(), Value::from(update_url));
        settings.save(partial).unwrap();
        let context = LauncherContext::with_settings(dir.path(), settings);
        (dir, context)
    }

    #[tokio::test]
    async fn test_check_without_update_url() {
        let (_dir, context) = context("");
        let manager = UpdateManager::new(&context).unwrap();

        let check = manager.check_for_updates(None).await;

        assert!(!check.has_update);
        assert_eq!(check.current_version, "1.0.0");
        assert!(check.error.is_some());
    }

    #[tokio::test]
    async fn test_apply_without_manifest() {
        let (_dir, context) = context("");
        let manager = UpdateManager::new(&context).unwrap();
        let mut rx = context.events.subscribe();

        let result = manager.download_and_apply(None);

        assert!(matches!(result, Err(LauncherError::NoManifest)));
        assert_eq!(
            rx.try_recv().unwrap(),
            LauncherEvent::UpdateError {
                message: "No update manifest available".into()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_update_reports_error_and_keeps_version() {
        let (dir, context) = context("");
        let manager = UpdateManager::new(&context).unwrap();
        let mut rx = context.events.subscribe();

        manager
            .download_and_apply(Some(UpdateManifest {
                version: "2.0.0".into(),
                zip_url: String::new(),
                sha256: String::new(),
            }))
            .unwrap();
        manager.wait().await;

        assert!(matches!(
            rx.try_recv(),
            Ok(LauncherEvent::UpdateError { .. })
        ));
        assert_eq!(
            context.settings.read().await.get_or(keys::VERSION, String::new()),
            "1.0.0"
        );
        assert!(!dir.path().join("temp_update").exists());
        assert!(!manager.is_updating());
    }

    #[tokio::test]
    async fn test_cancel_without_update() {
        let (_dir, context) = context("");
        let manager = UpdateManager::new(&context).unwrap();
        assert!(!manager.cancel_update().await);
    }
}
