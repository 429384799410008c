//! Settings methods on LauncherApi.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::launch::{LaunchConfig, Resolution};
use crate::settings;
use crate::LauncherApi;

impl LauncherApi {
    /// All settings, defaults included.
    pub async fn get_settings(&self) -> Map<String, Value> {
        self.state.context.settings.read().await.all().clone()
    }

    /// Merge `partial` into the settings, persist, and reload the launch
    /// configuration used by the controller.
    pub async fn save_settings(&self, partial: Map<String, Value>) -> Result<()> {
        let config = {
            let mut settings = self.state.context.settings.write().await;
            settings.save(partial)?;
            LaunchConfig::from_settings(&settings, &self.launcher_root)
        };
        self.state.controller.update_config(config);
        Ok(())
    }

    /// The launch configuration derived from the current settings.
    pub async fn launch_config(&self) -> LaunchConfig {
        let settings = self.state.context.settings.read().await;
        LaunchConfig::from_settings(&settings, &self.launcher_root)
    }

    /// Write the registry script for the stored resolution.
    pub async fn apply_resolution(&self) -> Result<PathBuf> {
        let settings = self.state.context.settings.read().await;
        settings::apply_resolution(&self.launcher_root, &settings)
    }

    /// Write the registry script for an explicit resolution.
    pub fn generate_registry_script(&self, width: u32, height: u32) -> Result<PathBuf> {
        settings::write_registry_script(&self.launcher_root, Resolution::new(width, height))
    }
}
