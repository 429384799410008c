//! Registry script for the client's resolution.
//!
//! The client reads its resolution from `HKCU\Software\Webzen\Mu\Config`.
//! The launcher writes a `.reg` file (UTF-16LE with BOM, as `regedit`
//! expects) under `reg_files/`; importing it is left to the user.

use crate::config::{PathsConfig, UiConfig};
use crate::error::{LauncherError, Result};
use crate::launch::Resolution;
use crate::settings::{keys, SettingsStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Text of the registry script for `resolution`.
pub fn registry_script(resolution: Resolution) -> String {
    format!(
        "Windows Registry Editor Version 5.00\n\n\
         [HKEY_CURRENT_USER\\Software\\Webzen\\Mu\\Config]\n\
         \"Width\"=dword:{:08x}\n\
         \"Height\"=dword:{:08x}\n\
         \"ColorDepth\"=dword:00000020\n\
         \"Windowed\"=dword:00000000\n",
        resolution.width, resolution.height
    )
}

/// Encode as UTF-16LE with a leading byte order mark.
pub fn encode_utf16le_with_bom(text: &str) -> Vec<u8> {
    std::iter::once('\u{feff}')
        .chain(text.chars())
        .collect::<String>()
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// Path of the script for `resolution` under `launcher_root`.
pub fn registry_script_path(launcher_root: &Path, resolution: Resolution) -> PathBuf {
    launcher_root
        .join(PathsConfig::REGISTRY_DIR_NAME)
        .join(format!("mu_resolution_{}.reg", resolution))
}

/// Write the script for `resolution` and return its path.
pub fn write_registry_script(launcher_root: &Path, resolution: Resolution) -> Result<PathBuf> {
    let path = registry_script_path(launcher_root, resolution);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| LauncherError::io_with_path(e, dir))?;
    }
    fs::write(&path, encode_utf16le_with_bom(&registry_script(resolution)))
        .map_err(|e| LauncherError::io_with_path(e, &path))?;
    info!("Registry file created: {}", path.display());
    Ok(path)
}

/// Generate the script for the stored `resolution` setting.
pub fn apply_resolution(launcher_root: &Path, settings: &SettingsStore) -> Result<PathBuf> {
    let raw: String = settings.get_or(keys::RESOLUTION, UiConfig::DEFAULT_RESOLUTION.to_string());
    let resolution: Resolution = raw.parse()?;
    write_registry_script(launcher_root, resolution)
}
