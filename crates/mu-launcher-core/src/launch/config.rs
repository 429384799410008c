//! Launch configuration derived from settings.

use crate::config::{AppConfig, EmbedConfig, ProcessConfig, UiConfig};
use crate::error::{LauncherError, Result};
use crate::settings::{keys, SettingsStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Client area size, written as `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LauncherError::Validation {
            field: keys::RESOLUTION.to_string(),
            message: format!("Invalid resolution format: {}. Expected format: WIDTHxHEIGHT", s),
        };
        let (width, height) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Everything a launch needs, read once from settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    pub executable: PathBuf,
    pub process_limit: u32,
    pub embed: bool,
    pub resolution: Resolution,
    pub discovery_interval: Duration,
    pub discovery_attempts: u32,
    pub terminate_grace: Duration,
    pub auxiliary_patterns: Vec<String>,
    pub kill_unmanaged: bool,
}

impl LaunchConfig {
    /// Config for `executable` with default tunables.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            process_limit: AppConfig::DEFAULT_PROCESS_LIMIT,
            embed: false,
            resolution: Resolution::new(1920, 1080),
            discovery_interval: EmbedConfig::DISCOVERY_INTERVAL,
            discovery_attempts: EmbedConfig::DISCOVERY_ATTEMPTS,
            terminate_grace: ProcessConfig::TERMINATE_GRACE,
            auxiliary_patterns: EmbedConfig::AUXILIARY_TITLE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            kill_unmanaged: false,
        }
    }

    /// Build from settings. A relative executable path resolves against
    /// `launcher_root`; a malformed resolution falls back to the default.
    pub fn from_settings(settings: &SettingsStore, launcher_root: &Path) -> Self {
        let executable: String =
            settings.get_or(keys::GAME_EXECUTABLE, AppConfig::DEFAULT_EXECUTABLE.to_string());
        let executable = if executable.trim().is_empty() {
            PathBuf::new()
        } else {
            let path = PathBuf::from(executable.trim());
            if path.is_absolute() {
                path
            } else {
                launcher_root.join(path)
            }
        };

        let resolution = settings
            .get_or(keys::RESOLUTION, UiConfig::DEFAULT_RESOLUTION.to_string())
            .parse()
            .unwrap_or(Resolution::new(1920, 1080));

        Self {
            process_limit: settings.get_or(keys::PROCESS_LIMIT, AppConfig::DEFAULT_PROCESS_LIMIT),
            embed: settings.get_or(keys::EMBED_GAME_WINDOW, false),
            kill_unmanaged: settings.get_or(keys::KILL_UNMANAGED_CLIENTS, false),
            resolution,
            ..Self::new(executable)
        }
    }

    pub fn with_embed(mut self, embed: bool) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_process_limit(mut self, limit: u32) -> Self {
        self.process_limit = limit;
        self
    }

    pub fn with_discovery(mut self, interval: Duration, attempts: u32) -> Self {
        self.discovery_interval = interval;
        self.discovery_attempts = attempts;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(LauncherError::ConfigInvalid {
                message: "game executable path is empty".into(),
            });
        }
        if self.process_limit == 0 {
            return Err(LauncherError::ConfigInvalid {
                message: "process limit must be at least 1".into(),
            });
        }
        if self.executable_name().is_none() {
            return Err(LauncherError::ConfigInvalid {
                message: format!("{} has no file name", self.executable.display()),
            });
        }
        Ok(())
    }

    /// Basename used to find running clients.
    pub fn executable_name(&self) -> Option<String> {
        self.executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Directory the client runs in.
    pub fn working_dir(&self) -> PathBuf {
        match self.executable.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
