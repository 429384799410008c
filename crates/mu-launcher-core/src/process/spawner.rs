//! Spawning and terminating game client processes.

use crate::error::{LauncherError, Result};
use crate::platform;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// Process creation and termination.
pub trait ProcessControl: Send + Sync {
    /// Start `executable` with `working_dir` as its current directory and
    /// return its PID.
    fn spawn(&self, executable: &Path, working_dir: &Path) -> Result<u32>;

    /// Ask the process to exit, forcing it after `grace`. Returns true when the
    /// process is gone.
    fn terminate(&self, pid: u32, grace: Duration) -> Result<bool>;

    /// Kill immediately. Returns true when the process is gone.
    fn kill(&self, pid: u32) -> Result<bool>;
}

/// [`ProcessControl`] over `std::process` and the platform helpers.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcessControl;

impl OsProcessControl {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for OsProcessControl {
    fn spawn(&self, executable: &Path, working_dir: &Path) -> Result<u32> {
        let mut cmd = Command::new(executable);
        cmd.current_dir(working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        #[cfg(windows)]
        {
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        debug!("Spawning {} in {}", executable.display(), working_dir.display());
        let mut child = cmd.spawn().map_err(|e| LauncherError::SpawnFailed {
            executable: executable.to_path_buf(),
            message: e.to_string(),
        })?;
        let pid = child.id();
        info!("Started {} with PID {}", executable.display(), pid);

        // Nothing else waits on the child, so reap it here to avoid a zombie.
        let spawned = std::thread::Builder::new()
            .name(format!("reap-{}", pid))
            .spawn(move || match child.wait() {
                Ok(status) => debug!("Process {} exited with {}", pid, status),
                Err(e) => warn!("Failed to wait for process {}: {}", pid, e),
            });
        if let Err(e) = spawned {
            warn!("Failed to start reaper for PID {}: {}", pid, e);
        }

        Ok(pid)
    }

    fn terminate(&self, pid: u32, grace: Duration) -> Result<bool> {
        platform::terminate_process(pid, grace)
    }

    fn kill(&self, pid: u32) -> Result<bool> {
        platform::kill_process(pid)
    }
}
