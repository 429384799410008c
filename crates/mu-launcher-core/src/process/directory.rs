//! OS process enumeration by executable name.

use crate::platform;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// A running process as seen by one enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    #[serde(rename = "name")]
    pub executable_name: String,
    /// Seconds since the UNIX epoch.
    #[serde(rename = "createTime")]
    pub creation_time: u64,
}

/// Source of process snapshots.
pub trait ProcessTable: Send + Sync {
    /// Every live process. Processes that exit mid-enumeration are omitted.
    fn snapshot(&self) -> Vec<ProcessRecord>;

    fn is_alive(&self, pid: u32) -> bool;
}

/// [`ProcessTable`] backed by `sysinfo`.
pub struct SysinfoProcessTable {
    system: Mutex<System>,
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn snapshot(&self) -> Vec<ProcessRecord> {
        let mut system = match self.system.lock() {
            Ok(system) => system,
            Err(poisoned) => {
                warn!("Process table lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new(),
        );

        system
            .processes()
            .iter()
            .filter(|(_, process)| is_live_process(process))
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                executable_name: process.name().to_string_lossy().into_owned(),
                creation_time: process.start_time(),
            })
            .collect()
    }

    fn is_alive(&self, pid: u32) -> bool {
        if !platform::is_process_alive(pid) {
            return false;
        }
        // kill(pid, 0) succeeds for zombies, so confirm with a targeted refresh
        let mut system = match self.system.lock() {
            Ok(system) => system,
            Err(poisoned) => poisoned.into_inner(),
        };
        let sys_pid = Pid::from_u32(pid);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::new(),
        );
        system.process(sys_pid).is_some_and(is_live_process)
    }
}

/// A running process, excluding zombies and the per-thread tasks that
/// sysinfo lists alongside processes on Linux.
fn is_live_process(process: &Process) -> bool {
    process.thread_kind().is_none()
        && !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

/// Compare executable names the way the platform's file system does.
pub fn names_match(a: &str, b: &str) -> bool {
    if cfg!(any(windows, target_os = "macos")) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Queries over a [`ProcessTable`].
#[derive(Clone)]
pub struct ProcessDirectory {
    table: Arc<dyn ProcessTable>,
}

impl ProcessDirectory {
    pub fn new(table: Arc<dyn ProcessTable>) -> Self {
        Self { table }
    }

    /// Create a directory over the native process table.
    pub fn native() -> Self {
        Self::new(Arc::new(SysinfoProcessTable::new()))
    }

    /// Live processes whose executable basename equals `name`.
    pub fn list_by_name(&self, name: &str) -> Vec<ProcessRecord> {
        let mut matches: Vec<ProcessRecord> = self
            .table
            .snapshot()
            .into_iter()
            .filter(|record| names_match(&record.executable_name, name))
            .collect();
        matches.sort_by_key(|record| record.pid);
        debug!("Found {} process(es) named {}", matches.len(), name);
        matches
    }

    pub fn count_by_name(&self, name: &str) -> usize {
        self.list_by_name(name).len()
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.table.is_alive(pid)
    }

    /// Re-query a single process.
    pub fn record(&self, pid: u32) -> Option<ProcessRecord> {
        self.table
            .snapshot()
            .into_iter()
            .find(|record| record.pid == pid)
    }
}
