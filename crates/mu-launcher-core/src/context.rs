//! Shared state handed to component constructors.

use crate::events::EventBus;
use crate::process::{
    ManagedPidSet, OsProcessControl, ProcessControl, ProcessTable, SysinfoProcessTable,
};
use crate::settings::SettingsStore;
use crate::window::WindowSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by the launcher's components.
///
/// Cloning is cheap; every clone refers to the same settings, managed PID
/// set and event bus.
#[derive(Debug, Clone)]
pub struct LauncherContext {
    launcher_root: PathBuf,
    pub managed: ManagedPidSet,
    pub events: EventBus,
    pub settings: Arc<RwLock<SettingsStore>>,
}

impl LauncherContext {
    /// Context rooted at `launcher_root`, loading `config.json` from it.
    pub fn load(launcher_root: impl Into<PathBuf>) -> Self {
        let launcher_root = launcher_root.into();
        let settings = SettingsStore::load(SettingsStore::default_path(&launcher_root));
        Self::with_settings(launcher_root, settings)
    }

    pub fn with_settings(launcher_root: impl Into<PathBuf>, settings: SettingsStore) -> Self {
        Self {
            launcher_root: launcher_root.into(),
            managed: ManagedPidSet::new(),
            events: EventBus::new(),
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn launcher_root(&self) -> &Path {
        &self.launcher_root
    }
}

/// OS-facing implementations used by the launch controller.
#[derive(Clone)]
pub struct PlatformBackends {
    pub processes: Arc<dyn ProcessTable>,
    pub control: Arc<dyn ProcessControl>,
    pub windows: Arc<dyn WindowSystem>,
}

impl PlatformBackends {
    /// The backends for the platform this binary was built for.
    pub fn native() -> Self {
        Self {
            processes: Arc::new(SysinfoProcessTable::new()),
            control: Arc::new(OsProcessControl::new()),
            windows: native_window_system(),
        }
    }
}

#[cfg(windows)]
fn native_window_system() -> Arc<dyn WindowSystem> {
    Arc::new(crate::platform::Win32WindowSystem::new())
}

#[cfg(not(windows))]
fn native_window_system() -> Arc<dyn WindowSystem> {
    Arc::new(crate::window::UnsupportedWindowSystem)
}
