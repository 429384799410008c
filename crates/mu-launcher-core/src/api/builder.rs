//! Builder for configuring LauncherApi initialization.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::ApiState;
use crate::config::{PathsConfig, ProcessConfig};
use crate::context::{LauncherContext, PlatformBackends};
use crate::error::{LauncherError, Result};
use crate::launch::{BackgroundScan, LaunchConfig, LaunchController};
use crate::update::UpdateManager;
use crate::LauncherApi;

/// Builder for configuring LauncherApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use mu_launcher_core::LauncherApi;
///
/// let api = LauncherApi::builder("C:/MU")
///     .auto_create_dirs(true)
///     .background_scan(None)
///     .build()
///     .await?;
/// ```
pub struct LauncherApiBuilder {
    launcher_root: PathBuf,
    auto_create_dirs: bool,
    backends: Option<PlatformBackends>,
    scan_interval: Option<Duration>,
}

impl LauncherApiBuilder {
    /// Create a new builder with the launcher root directory.
    pub fn new(launcher_root: impl Into<PathBuf>) -> Self {
        Self {
            launcher_root: launcher_root.into(),
            auto_create_dirs: false,
            backends: None,
            scan_interval: Some(ProcessConfig::SCAN_INTERVAL),
        }
    }

    /// Create the launcher root and its `logs/` directory when missing.
    ///
    /// Default: `false` (the root must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Use these process and window backends instead of the native ones.
    pub fn with_backends(mut self, backends: PlatformBackends) -> Self {
        self.backends = Some(backends);
        self
    }

    /// Interval of the unmanaged-client sweep; `None` disables it.
    ///
    /// Default: every 10 seconds
    pub fn background_scan(mut self, interval: Option<Duration>) -> Self {
        self.scan_interval = interval;
        self
    }

    fn create_directory_structure(&self) -> Result<()> {
        let dirs = [
            self.launcher_root.clone(),
            self.launcher_root.join(PathsConfig::LOGS_DIR_NAME),
        ];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| LauncherError::Io {
                    message: format!("Failed to create directory: {}", dir.display()),
                    path: Some(dir.clone()),
                    source: Some(e),
                })?;
            }
        }
        Ok(())
    }

    /// Build the LauncherApi instance.
    pub async fn build(self) -> Result<LauncherApi> {
        if self.auto_create_dirs {
            self.create_directory_structure()?;
        } else if !self.launcher_root.is_dir() {
            return Err(LauncherError::ConfigInvalid {
                message: format!(
                    "Launcher root does not exist: {}",
                    self.launcher_root.display()
                ),
            });
        }

        let context = LauncherContext::load(&self.launcher_root);
        let config = {
            let settings = context.settings.read().await;
            LaunchConfig::from_settings(&settings, &self.launcher_root)
        };
        let backends = self.backends.unwrap_or_else(PlatformBackends::native);
        let controller = LaunchController::new(&context, &backends, config);
        let updates = UpdateManager::new(&context)?;

        let scan = self.scan_interval.map(|interval| {
            tracing::debug!("Starting background scan every {:?}", interval);
            BackgroundScan::spawn(controller.clone(), interval)
        });

        tracing::info!(
            "Launcher API ready at {} (embedding supported: {})",
            self.launcher_root.display(),
            backends.windows.supports_embedding()
        );

        Ok(LauncherApi {
            launcher_root: self.launcher_root,
            state: Arc::new(ApiState {
                context,
                controller,
                updates,
                scan: Mutex::new(scan),
            }),
        })
    }
}
