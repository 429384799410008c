//! Window location, embedding and supervision.
//!
//! Everything here talks to the OS through the [`WindowSystem`] trait so the
//! embedding policy can be exercised without a desktop session. The Win32
//! backend lives in `platform::win32`; other platforms get
//! [`UnsupportedWindowSystem`], which makes every launch fall back to
//! detached mode.

pub mod engine;
pub mod locator;
pub mod supervisor;

pub use engine::{EmbedReport, EmbeddingEngine, StepOutcome};
pub use locator::WindowLocator;
pub use supervisor::EmbeddingSupervisor;

use crate::error::{LauncherError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque OS window handle.
///
/// Serialized as a plain integer so the UI can hand the host handle back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn raw(self) -> isize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A window handle paired with the PID that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub handle: WindowHandle,
    pub pid: u32,
}

/// Window style bits relevant to embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowStyle(pub u32);

impl WindowStyle {
    pub const CHILD: u32 = 0x4000_0000;
    pub const POPUP: u32 = 0x8000_0000;
    pub const CAPTION: u32 = 0x00C0_0000;
    pub const BORDER: u32 = 0x0080_0000;
    pub const THICKFRAME: u32 = 0x0004_0000;

    /// Bits that make a window a decorated top-level window.
    pub const TOP_LEVEL_MASK: u32 = Self::POPUP | Self::CAPTION | Self::THICKFRAME | Self::BORDER;

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    /// The style an embedded window must carry: decorations stripped, child set.
    pub fn embedded(self) -> Self {
        Self((self.0 & !Self::TOP_LEVEL_MASK) | Self::CHILD)
    }

    /// The style restored when a window is released back to the desktop.
    pub fn detached(self) -> Self {
        Self(self.0 & !Self::CHILD)
    }

    /// True when an embedded window has regained top-level decorations or
    /// lost its child bit.
    pub fn is_drifted(self) -> bool {
        !self.contains(Self::CHILD) || self.0 & Self::TOP_LEVEL_MASK != 0
    }
}

impl fmt::Display for WindowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Window-system primitives used by the locator, engine and supervisor.
///
/// Fallible calls report the failing operation through
/// [`LauncherError::WindowOperation`].
pub trait WindowSystem: Send + Sync {
    /// Whether reparenting foreign windows is possible on this backend.
    fn supports_embedding(&self) -> bool;

    /// All top-level windows in OS enumeration order.
    fn top_level_windows(&self) -> Vec<WindowHandle>;

    fn is_window(&self, handle: WindowHandle) -> bool;

    fn is_visible(&self, handle: WindowHandle) -> bool;

    fn owner_pid(&self, handle: WindowHandle) -> Option<u32>;

    fn title(&self, handle: WindowHandle) -> String;

    fn style(&self, handle: WindowHandle) -> Result<WindowStyle>;

    fn set_style(&self, handle: WindowHandle, style: WindowStyle) -> Result<()>;

    fn parent(&self, handle: WindowHandle) -> Option<WindowHandle>;

    /// Reparent `child`; `None` returns it to the desktop.
    fn set_parent(&self, child: WindowHandle, parent: Option<WindowHandle>) -> Result<()>;

    /// Move and resize, showing the window and applying frame changes.
    fn place(&self, handle: WindowHandle, x: i32, y: i32, width: u32, height: u32) -> Result<()>;

    /// Re-apply the frame after a style change without moving the window.
    fn refresh_frame(&self, handle: WindowHandle) -> Result<()>;

    /// Restore (if minimized) and foreground the window.
    fn bring_to_front(&self, handle: WindowHandle) -> Result<()>;
}

/// Backend for platforms without native window embedding.
///
/// Reports no windows, so discovery never succeeds and launches stay detached.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedWindowSystem;

impl UnsupportedWindowSystem {
    fn unsupported<T>(operation: &'static str, handle: WindowHandle) -> Result<T> {
        Err(LauncherError::WindowOperation {
            operation,
            handle: handle.raw(),
            code: 0,
        })
    }
}

impl WindowSystem for UnsupportedWindowSystem {
    fn supports_embedding(&self) -> bool {
        false
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        Vec::new()
    }

    fn is_window(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn is_visible(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn owner_pid(&self, _handle: WindowHandle) -> Option<u32> {
        None
    }

    fn title(&self, _handle: WindowHandle) -> String {
        String::new()
    }

    fn style(&self, handle: WindowHandle) -> Result<WindowStyle> {
        Self::unsupported("GetWindowLong", handle)
    }

    fn set_style(&self, handle: WindowHandle, _style: WindowStyle) -> Result<()> {
        Self::unsupported("SetWindowLong", handle)
    }

    fn parent(&self, _handle: WindowHandle) -> Option<WindowHandle> {
        None
    }

    fn set_parent(&self, child: WindowHandle, _parent: Option<WindowHandle>) -> Result<()> {
        Self::unsupported("SetParent", child)
    }

    fn place(&self, handle: WindowHandle, _x: i32, _y: i32, _w: u32, _h: u32) -> Result<()> {
        Self::unsupported("SetWindowPos", handle)
    }

    fn refresh_frame(&self, handle: WindowHandle) -> Result<()> {
        Self::unsupported("SetWindowPos", handle)
    }

    fn bring_to_front(&self, handle: WindowHandle) -> Result<()> {
        Self::unsupported("SetForegroundWindow", handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_style_strips_decorations() {
        let original = WindowStyle(
            WindowStyle::POPUP | WindowStyle::CAPTION | WindowStyle::THICKFRAME | 0x0001_0000,
        );
        let embedded = original.embedded();

        assert!(embedded.contains(WindowStyle::CHILD));
        assert_eq!(embedded.bits() & WindowStyle::TOP_LEVEL_MASK, 0);
        // Unrelated bits survive
        assert!(embedded.contains(0x0001_0000));
        assert!(!embedded.is_drifted());
    }

    #[test]
    fn test_drift_detection() {
        let embedded = WindowStyle(WindowStyle::CHILD);
        assert!(!embedded.is_drifted());
        assert!(WindowStyle(WindowStyle::CHILD | WindowStyle::CAPTION).is_drifted());
        assert!(WindowStyle(0).is_drifted());
    }

    #[test]
    fn test_detached_clears_child_bit() {
        let style = WindowStyle(WindowStyle::CHILD | WindowStyle::CAPTION);
        assert_eq!(style.detached(), WindowStyle(WindowStyle::CAPTION));
    }

    #[test]
    fn test_handle_serializes_as_integer() {
        let json = serde_json::to_string(&WindowHandle(4242)).unwrap();
        assert_eq!(json, "4242");
        assert_eq!(WindowHandle(0x10).to_string(), "0x10");
    }

    #[test]
    fn test_handles_order_by_raw_value() {
        let mut handles = vec![WindowHandle(0x30), WindowHandle(-1), WindowHandle(0x10)];
        handles.sort();
        assert_eq!(handles, vec![WindowHandle(-1), WindowHandle(0x10), WindowHandle(0x30)]);

        let table: std::collections::BTreeMap<WindowHandle, &str> =
            [(WindowHandle(2), "game"), (WindowHandle(1), "host")].into_iter().collect();
        assert_eq!(table.keys().next(), Some(&WindowHandle(1)));
    }

    #[test]
    fn test_unsupported_backend_reports_failures() {
        let ws = UnsupportedWindowSystem;
        assert!(!ws.supports_embedding());
        assert!(ws.top_level_windows().is_empty());
        assert!(ws.style(WindowHandle(1)).is_err());
    }
}
