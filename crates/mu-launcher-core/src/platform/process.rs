//! Platform-specific process control.
//!
//! Liveness checks, graceful termination with a forced fallback, and an
//! immediate kill. Spawned clients are reaped by their own waiter thread, so
//! `waitpid` here is best-effort only.
#![allow(unsafe_code)]

use crate::error::{LauncherError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Check if a process with the given PID is alive.
///
/// # Platform Behavior
/// - **Linux/macOS**: Uses `kill(pid, 0)` signal check
/// - **Windows**: Uses `OpenProcess` with `PROCESS_QUERY_LIMITED_INFORMATION`
pub fn is_process_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }

    #[cfg(unix)]
    {
        // SAFETY: signal 0 performs only the existence/permission check.
        unsafe { libc::kill(pid as i32, 0) == 0 }
    }

    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
        };

        // SAFETY: the handle is checked for null and closed before returning.
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
            if handle.is_null() {
                false
            } else {
                CloseHandle(handle);
                true
            }
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        warn!("Process alive check not implemented for this platform");
        true
    }
}

/// Terminate a process gracefully, then forcefully once `grace` has elapsed.
///
/// # Platform Behavior
/// - **Linux/macOS**: SIGTERM, poll, then SIGKILL
/// - **Windows**: `taskkill /PID {pid} /T` (close request), poll, then `/F /T`
///
/// # Returns
/// `true` if the process is gone (or was never running).
pub fn terminate_process(pid: u32, grace: Duration) -> Result<bool> {
    if !is_process_alive(pid) {
        debug!("Process {} is not running", pid);
        return Ok(true);
    }

    request_exit(pid)?;
    if wait_for_exit(pid, grace) {
        debug!("Process {} terminated gracefully", pid);
        return Ok(true);
    }

    debug!("Process {} still running after {:?}, forcing", pid, grace);
    kill_process(pid)
}

/// Kill a process immediately without a grace period.
pub fn kill_process(pid: u32) -> Result<bool> {
    if !is_process_alive(pid) {
        return Ok(true);
    }

    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => {}
            Err(nix::errno::Errno::ESRCH) => return Ok(true),
            Err(e) => {
                return Err(LauncherError::ProcessControl {
                    pid,
                    message: format!("SIGKILL failed: {}", e),
                })
            }
        }
    }

    #[cfg(windows)]
    {
        if !run_taskkill(pid, true)? {
            return Ok(false);
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        return Err(LauncherError::ProcessControl {
            pid,
            message: "Process termination not implemented for this platform".into(),
        });
    }

    Ok(wait_for_exit(pid, Duration::from_secs(1)))
}

fn request_exit(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        debug!("Sending SIGTERM to process {}", pid);
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            if e != nix::errno::Errno::ESRCH {
                warn!("Failed to send SIGTERM to {}: {}", pid, e);
            }
        }
        Ok(())
    }

    #[cfg(windows)]
    {
        run_taskkill(pid, false).map(|_| ())
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(LauncherError::ProcessControl {
            pid,
            message: "Process termination not implemented for this platform".into(),
        })
    }
}

/// Poll until the process disappears or the timeout elapses.
fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        reap(pid);
        if !is_process_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn reap(pid: u32) {
    use nix::sys::wait::{waitpid, WaitPidFlag};
    use nix::unistd::Pid;

    // ECHILD is expected when the process is not ours or already reaped.
    let _ = waitpid(Pid::from_raw(pid as i32), Some(WaitPidFlag::WNOHANG));
}

#[cfg(not(unix))]
fn reap(_pid: u32) {}

#[cfg(windows)]
fn run_taskkill(pid: u32, force: bool) -> Result<bool> {
    use std::process::Command;

    let pid_arg = pid.to_string();
    let mut args = vec!["/PID", pid_arg.as_str(), "/T"];
    if force {
        args.push("/F");
    }
    debug!("Running taskkill {:?}", args);

    let output = Command::new("taskkill")
        .args(&args)
        .output()
        .map_err(|e| LauncherError::ProcessControl {
            pid,
            message: format!("Failed to run taskkill: {}", e),
        })?;

    if output.status.success() {
        return Ok(true);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("not found") || stderr.contains("not running") {
        Ok(true)
    } else {
        warn!("taskkill failed for {}: {}", pid, stderr.trim());
        Ok(false)
    }
}
