//! Centralized configuration constants for the launcher.
//!
//! Runtime, user-editable values live in the settings store; this module only
//! holds tunables and file names.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "MU Online Launcher";
    pub const USER_AGENT: &'static str = "MULauncher/1.0";
    pub const DEFAULT_EXECUTABLE: &'static str = "main.exe";
    pub const DEFAULT_PROCESS_LIMIT: u32 = 3;
    pub const DEFAULT_VERSION: &'static str = "1.0.0";
}

/// Window discovery and embedding supervision.
pub struct EmbedConfig;

impl EmbedConfig {
    /// Interval between drift checks while a window is embedded.
    pub const RECONCILE_INTERVAL: Duration = Duration::from_secs(1);
    /// Interval between window lookups after spawning the client.
    pub const DISCOVERY_INTERVAL: Duration = Duration::from_millis(300);
    pub const DISCOVERY_ATTEMPTS: u32 = 10;
    /// Case-insensitive title substrings of windows that are never embedded.
    pub const AUXILIARY_TITLE_PATTERNS: &'static [&'static str] = &["debugger"];
}

/// Process control timing.
pub struct ProcessConfig;

impl ProcessConfig {
    /// Grace period between a graceful terminate and a forced kill.
    pub const TERMINATE_GRACE: Duration = Duration::from_secs(3);
    /// Interval of the background sweep for unmanaged clients.
    pub const SCAN_INTERVAL: Duration = Duration::from_secs(10);
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DOWNLOAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const MAX_RETRIES: u32 = 3;
    pub const MANIFEST_FILE_NAME: &'static str = "launcher-manifest.json";
    pub const DOWNLOAD_TEMP_SUFFIX: &'static str = ".part";
    /// How long `cancel_update` waits for the worker to wind down.
    pub const CANCEL_WAIT: Duration = Duration::from_secs(5);
}

/// Directory and file names relative to the launcher root.
pub struct PathsConfig;

impl PathsConfig {
    pub const SETTINGS_FILE_NAME: &'static str = "config.json";
    pub const LOGS_DIR_NAME: &'static str = "logs";
    pub const LOG_FILE_NAME: &'static str = "launcher.log";
    pub const REGISTRY_DIR_NAME: &'static str = "reg_files";
    pub const UPDATE_TEMP_DIR_NAME: &'static str = "temp_update";
}

/// Content area sizes offered by the UI.
pub struct UiConfig;

impl UiConfig {
    pub const DEFAULT_RESOLUTION: &'static str = "1920x1080";
    pub const SUPPORTED_RESOLUTIONS: &'static [&'static str] = &[
        "640x480",
        "800x600",
        "1024x768",
        "1280x1024",
        "1366x768",
        "1440x900",
        "1600x900",
        "1680x1050",
        "1920x1080",
    ];
}
