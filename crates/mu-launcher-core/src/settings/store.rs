//! The settings document (`config.json` at the launcher root).

use crate::config::{AppConfig, PathsConfig, UiConfig};
use crate::error::Result;
use crate::settings::persist::{atomic_read_json, atomic_write_json};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Setting keys. Mixed casing matches the UI's existing documents.
pub mod keys {
    pub const LANGUAGE: &str = "language";
    pub const RESOLUTION: &str = "resolution";
    pub const MUTE_INACTIVE_TABS: &str = "muteInactiveTabs";
    pub const EMBED_GAME_WINDOW: &str = "embedGameWindow";
    pub const PROCESS_LIMIT: &str = "processLimit";
    pub const GAME_EXECUTABLE: &str = "game_executable";
    pub const KILL_UNMANAGED_CLIENTS: &str = "kill_unmanaged_clients";
    pub const WINDOW_MODE: &str = "window_mode";
    pub const SOUND: &str = "sound";
    pub const MUSIC: &str = "music";
    pub const SERVER_NAME: &str = "server_name";
    pub const VERSION: &str = "version";
    pub const UPDATE_URL: &str = "update_url";
    pub const API_URL: &str = "api_url";
}

/// Flat key-value settings with defaults for every known key.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Default values for every known key.
    pub fn defaults() -> Map<String, Value> {
        let mut defaults = Map::new();
        let mut put = |key: &str, value: Value| {
            defaults.insert(key.to_string(), value);
        };
        put(keys::LANGUAGE, json!("en"));
        put(keys::RESOLUTION, json!(UiConfig::DEFAULT_RESOLUTION));
        put(keys::MUTE_INACTIVE_TABS, json!(false));
        put(keys::EMBED_GAME_WINDOW, json!(false));
        put(keys::PROCESS_LIMIT, json!(AppConfig::DEFAULT_PROCESS_LIMIT));
        put(keys::GAME_EXECUTABLE, json!(AppConfig::DEFAULT_EXECUTABLE));
        put(keys::KILL_UNMANAGED_CLIENTS, json!(false));
        put(keys::WINDOW_MODE, json!(true));
        put(keys::SOUND, json!(true));
        put(keys::MUSIC, json!(true));
        put(keys::SERVER_NAME, json!("MU Online Custom Server"));
        put(keys::VERSION, json!(AppConfig::DEFAULT_VERSION));
        put(keys::UPDATE_URL, json!("http://localhost/update/"));
        put(keys::API_URL, json!("http://localhost/CustomLauncher/api/"));
        defaults
    }

    /// Settings file location under a launcher root.
    pub fn default_path(launcher_root: &Path) -> PathBuf {
        launcher_root.join(PathsConfig::SETTINGS_FILE_NAME)
    }

    /// Defaults only, bound to `path` but not read from it.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: Self::defaults(),
        }
    }

    /// Load `path`, merging stored values over the defaults.
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is
    /// logged and also yields the defaults; it is overwritten on next save.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut values = Self::defaults();

        match atomic_read_json::<Value>(&path) {
            Ok(Some(Value::Object(stored))) => {
                values.extend(stored);
                info!("Loaded settings from {}", path.display());
            }
            Ok(Some(other)) => {
                warn!(
                    "Settings file {} is not an object ({}), using defaults",
                    path.display(),
                    type_name(&other)
                );
            }
            Ok(None) => info!("No settings at {}, using defaults", path.display()),
            Err(e) => warn!("Error loading settings: {}", e),
        }

        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed lookup; a missing or mistyped value yields `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.values.get(key) {
            Some(value) => match T::deserialize(value) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Setting {} has unexpected value {}: {}", key, value, e);
                    default
                }
            },
            None => default,
        }
    }

    /// Set one key and persist.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.values.insert(key.into(), value.into());
        self.persist()
    }

    /// Merge `partial` over the current values and persist.
    pub fn save(&mut self, partial: Map<String, Value>) -> Result<()> {
        self.values.extend(partial);
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        atomic_write_json(&self.path, &self.values, false)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
