//! Win32 implementation of [`WindowSystem`].
//!
//! Thin wrappers over `user32`. Failures are mapped to
//! [`LauncherError::WindowOperation`] carrying `GetLastError`.
#![allow(unsafe_code)]

use crate::error::{LauncherError, Result};
use crate::window::{WindowHandle, WindowStyle, WindowSystem};
use std::ffi::c_void;
use tracing::{debug, warn};
use windows_sys::Win32::Foundation::{GetLastError, SetLastError, BOOL, HWND, LPARAM};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetParent, GetWindowLongW, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, SetForegroundWindow,
    SetParent, SetWindowLongW, SetWindowPos, ShowWindow, GWL_STYLE, SWP_FRAMECHANGED,
    SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SWP_SHOWWINDOW, SW_RESTORE, SW_SHOW,
};

/// Native window backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }
}

fn hwnd(handle: WindowHandle) -> HWND {
    handle.raw() as *mut c_void
}

fn handle_of(hwnd: HWND) -> Option<WindowHandle> {
    if hwnd.is_null() {
        None
    } else {
        Some(WindowHandle(hwnd as isize))
    }
}

fn last_error(operation: &'static str, handle: WindowHandle) -> LauncherError {
    // SAFETY: GetLastError reads thread-local state only.
    let code = unsafe { GetLastError() };
    LauncherError::WindowOperation {
        operation,
        handle: handle.raw(),
        code,
    }
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the `&mut Vec<WindowHandle>` passed by
    // `top_level_windows`, which outlives the synchronous EnumWindows call.
    let windows = unsafe { &mut *(lparam as *mut Vec<WindowHandle>) };
    windows.push(WindowHandle(hwnd as isize));
    1
}

impl WindowSystem for Win32WindowSystem {
    fn supports_embedding(&self) -> bool {
        true
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        let mut windows: Vec<WindowHandle> = Vec::new();
        // SAFETY: the callback only touches the vector behind lparam.
        let ok = unsafe {
            EnumWindows(
                Some(collect_window),
                &mut windows as *mut Vec<WindowHandle> as LPARAM,
            )
        };
        if ok == 0 {
            warn!("EnumWindows failed after {} windows", windows.len());
        }
        windows
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        // SAFETY: IsWindow accepts any value, including stale handles.
        unsafe { IsWindow(hwnd(handle)) != 0 }
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        // SAFETY: read-only query on a possibly stale handle.
        unsafe { IsWindowVisible(hwnd(handle)) != 0 }
    }

    fn owner_pid(&self, handle: WindowHandle) -> Option<u32> {
        let mut pid: u32 = 0;
        // SAFETY: pid is a valid out pointer for the duration of the call.
        let thread = unsafe { GetWindowThreadProcessId(hwnd(handle), &mut pid) };
        if thread == 0 || pid == 0 {
            None
        } else {
            Some(pid)
        }
    }

    fn title(&self, handle: WindowHandle) -> String {
        // SAFETY: the buffer is sized from GetWindowTextLengthW plus the terminator
        // and GetWindowTextW never writes past the length it is given.
        unsafe {
            let len = GetWindowTextLengthW(hwnd(handle));
            if len <= 0 {
                return String::new();
            }
            let mut buf = vec![0u16; len as usize + 1];
            let copied = GetWindowTextW(hwnd(handle), buf.as_mut_ptr(), buf.len() as i32);
            String::from_utf16_lossy(&buf[..copied.max(0) as usize])
        }
    }

    fn style(&self, handle: WindowHandle) -> Result<WindowStyle> {
        // SAFETY: a zero return is disambiguated through the cleared last error.
        unsafe {
            SetLastError(0);
            let bits = GetWindowLongW(hwnd(handle), GWL_STYLE);
            if bits == 0 && GetLastError() != 0 {
                return Err(last_error("GetWindowLongW", handle));
            }
            Ok(WindowStyle(bits as u32))
        }
    }

    fn set_style(&self, handle: WindowHandle, style: WindowStyle) -> Result<()> {
        // SAFETY: as in `style`; the previous value may legitimately be zero.
        unsafe {
            SetLastError(0);
            let previous = SetWindowLongW(hwnd(handle), GWL_STYLE, style.bits() as i32);
            if previous == 0 && GetLastError() != 0 {
                return Err(last_error("SetWindowLongW", handle));
            }
        }
        debug!("Set style of {} to {}", handle, style);
        Ok(())
    }

    fn parent(&self, handle: WindowHandle) -> Option<WindowHandle> {
        // SAFETY: read-only query.
        handle_of(unsafe { GetParent(hwnd(handle)) })
    }

    fn set_parent(&self, child: WindowHandle, parent: Option<WindowHandle>) -> Result<()> {
        let new_parent = parent.map(hwnd).unwrap_or(std::ptr::null_mut());
        // SAFETY: a null previous parent is ambiguous, so the last error decides.
        unsafe {
            SetLastError(0);
            let previous = SetParent(hwnd(child), new_parent);
            if previous.is_null() && GetLastError() != 0 {
                return Err(last_error("SetParent", child));
            }
        }
        Ok(())
    }

    fn place(&self, handle: WindowHandle, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        // SAFETY: plain value arguments.
        let ok = unsafe {
            SetWindowPos(
                hwnd(handle),
                std::ptr::null_mut(),
                x,
                y,
                width,
                height,
                SWP_NOZORDER | SWP_SHOWWINDOW | SWP_FRAMECHANGED,
            )
        };
        if ok == 0 {
            return Err(last_error("SetWindowPos", handle));
        }
        Ok(())
    }

    fn refresh_frame(&self, handle: WindowHandle) -> Result<()> {
        // SAFETY: plain value arguments.
        let ok = unsafe {
            SetWindowPos(
                hwnd(handle),
                std::ptr::null_mut(),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_FRAMECHANGED | SWP_SHOWWINDOW,
            )
        };
        if ok == 0 {
            return Err(last_error("SetWindowPos", handle));
        }
        // SAFETY: plain value arguments; the return is the previous visibility.
        unsafe {
            ShowWindow(hwnd(handle), SW_SHOW);
        }
        Ok(())
    }

    fn bring_to_front(&self, handle: WindowHandle) -> Result<()> {
        // SAFETY: plain value arguments.
        unsafe {
            if IsIconic(hwnd(handle)) != 0 {
                ShowWindow(hwnd(handle), SW_RESTORE);
            }
            if SetForegroundWindow(hwnd(handle)) == 0 {
                // Foreground lock is common; restoring is still useful.
                debug!("SetForegroundWindow refused for {}", handle);
                ShowWindow(hwnd(handle), SW_RESTORE);
            }
        }
        Ok(())
    }
}
