//! Atomic JSON persistence.
//!
//! Writes go to a temp file with a PID+TID suffix, are validated by
//! re-parsing, synced, and then renamed over the target.

use crate::error::{LauncherError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process;
use std::thread;
use tracing::{debug, warn};

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LauncherError::io_with_path(e, path)),
    };

    let data: T = serde_json::from_str(&contents).map_err(|e| LauncherError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically, optionally keeping a `.bak` of the
/// previous contents.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| LauncherError::io_with_path(e, parent))?;
        }
    }

    let temp_path = path.with_extension(format!("json.{}.{}.tmp", process::id(), thread_id()));

    let serialized = serde_json::to_string_pretty(data).map_err(|e| LauncherError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;
    serde_json::from_str::<serde_json::Value>(&serialized).map_err(|e| LauncherError::Json {
        message: format!("JSON validation failed: {}", e),
        source: Some(e),
    })?;

    let written = (|| -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(serialized.as_bytes())?;
        file.flush()?;
        file.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(LauncherError::io_with_path(e, &temp_path));
    }

    if keep_backup && path.exists() {
        let backup_path = path.with_extension("json.bak");
        match fs::copy(path, &backup_path) {
            Ok(_) => debug!("Created backup: {}", backup_path.display()),
            Err(e) => warn!("Failed to create backup {}: {}", backup_path.display(), e),
        }
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(LauncherError::io_with_path(e, path));
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

fn thread_id() -> String {
    // ThreadId's Debug output is "ThreadId(N)"; keep the digits only.
    format!("{:?}", thread::current().id())
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}
