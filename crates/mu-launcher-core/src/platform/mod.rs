//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here: process liveness
//! and termination in `process`, and the Win32 window backend in `win32`.
//!
//! # Supported Platforms
//!
//! - **Windows**: Full support, including window embedding
//! - **Linux/macOS**: Process control only; embedding degrades to detached mode

pub mod process;
#[cfg(windows)]
pub mod win32;

pub use process::{is_process_alive, kill_process, terminate_process};
#[cfg(windows)]
pub use win32::Win32WindowSystem;

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

/// Returns true if native window embedding is available on this platform.
pub fn supports_window_embedding() -> bool {
    cfg!(windows)
}
