//! Game client methods on LauncherApi.

use crate::error::Result;
use crate::launch::{LaunchConfig, LaunchOutcome};
use crate::process::ProcessRecord;
use crate::window::WindowHandle;
use crate::LauncherApi;

impl LauncherApi {
    // ========================================
    // Game Client Methods
    // ========================================

    /// Launch a client with the current settings.
    pub async fn launch_game(&self) -> LaunchOutcome {
        let config = self.launch_config().await;
        self.state.controller.launch(config).await
    }

    /// Launch with an explicit configuration.
    pub async fn launch_with(&self, config: LaunchConfig) -> LaunchOutcome {
        self.state.controller.launch(config).await
    }

    /// Close every client this launcher started.
    pub async fn close_game(&self) -> bool {
        self.state.controller.close().await
    }

    pub async fn bring_to_front(&self) -> bool {
        self.state.controller.bring_to_front().await
    }

    pub fn list_unmanaged(&self) -> Vec<ProcessRecord> {
        self.state.controller.list_unmanaged()
    }

    pub async fn kill_unmanaged(&self, pid: u32) -> bool {
        self.state.controller.kill_unmanaged(pid).await
    }

    /// Resize the embedded window (and the next one embedded).
    pub async fn set_target_size(&self, width: u32, height: u32) -> bool {
        self.state.controller.set_target_size(width, height).await
    }

    /// Register the UI container window the game is embedded into.
    pub fn attach_host(&self, host: WindowHandle) -> Result<()> {
        self.state.controller.attach_host(host)
    }

    pub async fn is_embedded(&self) -> bool {
        self.state.controller.supervisor().is_embedded().await
    }

    pub fn managed_pids(&self) -> Vec<u32> {
        self.state.controller.managed().pids()
    }
}
