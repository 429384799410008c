//! MU Launcher Core - Headless library behind the MU Online launcher shell.
//!
//! This crate spawns and tracks game clients, embeds the client window into
//! the launcher's UI container, keeps it embedded, and manages settings and
//! self-updates. It has no UI; the `mu-launcher-rpc` binary exposes it to the
//! shell over JSON-RPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use mu_launcher_core::LauncherApi;
//!
//! #[tokio::main]
//! async fn main() -> mu_launcher_core::Result<()> {
//!     let api = LauncherApi::new("C:/MU").await?;
//!
//!     let outcome = api.launch_game().await;
//!     println!("{}", outcome.message);
//!
//!     for process in api.list_unmanaged() {
//!         println!("Unmanaged client {} (PID {})", process.executable_name, process.pid);
//!     }
//!
//!     api.close_game().await;
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod launch;
pub mod platform;
pub mod process;
pub mod settings;
pub mod update;
pub mod window;

mod api;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use context::{LauncherContext, PlatformBackends};
pub use error::{LauncherError, Result};
pub use events::{EventBus, LauncherEvent};
pub use launch::{LaunchConfig, LaunchController, LaunchOutcome, Resolution};
pub use process::{ProcessDirectory, ProcessRecord};
pub use settings::SettingsStore;
pub use update::{UpdateCheck, UpdateManager, UpdateManifest};
pub use window::{EmbedReport, EmbeddingEngine, EmbeddingSupervisor, WindowHandle, WindowLocator};

pub use api::LauncherApiBuilder;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

use api::ApiState;

/// Main entry point of the launcher core.
///
/// Cloning is cheap; clones share the controller, settings and update
/// manager.
#[derive(Clone)]
pub struct LauncherApi {
    /// Directory holding `config.json`, the game files and `logs/`
    launcher_root: PathBuf,
    state: Arc<ApiState>,
}

impl LauncherApi {
    /// Build an API over an existing launcher root with native backends.
    pub async fn new(launcher_root: impl Into<PathBuf>) -> Result<Self> {
        LauncherApiBuilder::new(launcher_root).build().await
    }

    pub fn builder(launcher_root: impl Into<PathBuf>) -> LauncherApiBuilder {
        LauncherApiBuilder::new(launcher_root)
    }

    pub fn launcher_root(&self) -> &Path {
        &self.launcher_root
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LauncherEvent> {
        self.state.context.events.subscribe()
    }

    /// Stop background work: the scan, window discovery, supervision and any
    /// running update. Game clients keep running.
    pub async fn shutdown(&self) {
        self.state.stop_scan();
        self.state.controller.shutdown().await;
        if self.state.updates.cancel_update().await {
            tracing::info!("Cancelled running update during shutdown");
        }
        tracing::info!("Launcher API shut down");
    }
}
