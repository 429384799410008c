//! In-memory window and process backends for unit tests.

use crate::error::{LauncherError, Result};
use crate::process::{ProcessControl, ProcessRecord, ProcessTable};
use crate::window::{WindowHandle, WindowStyle, WindowSystem};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

const ERROR_ACCESS_DENIED: u32 = 5;
const ERROR_INVALID_WINDOW_HANDLE: u32 = 1400;

/// Style of a freshly created decorated window (overlapped + visible).
const TOP_LEVEL_STYLE: WindowStyle = WindowStyle(0x10CF_0000);

/// State of one simulated window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimWindow {
    pub pid: u32,
    pub title: String,
    pub style: WindowStyle,
    pub initial_style: WindowStyle,
    pub parent: Option<WindowHandle>,
    pub rect: (i32, i32, u32, u32),
    pub visible: bool,
    pub destroyed: bool,
    /// Number of enumerations after which the window exists.
    pub appear_after: u32,
}

#[derive(Default)]
struct SimState {
    windows: BTreeMap<WindowHandle, SimWindow>,
    order: Vec<WindowHandle>,
    next_handle: isize,
    enumerations: u32,
    failing: HashSet<&'static str>,
    foreground: Option<WindowHandle>,
}

impl SimState {
    fn exists(&self, handle: WindowHandle) -> bool {
        self.windows
            .get(&handle)
            .is_some_and(|w| !w.destroyed && self.enumerations >= w.appear_after)
    }

    fn check(&self, operation: &'static str, handle: WindowHandle) -> Result<()> {
        let code = if self.failing.contains(operation) {
            ERROR_ACCESS_DENIED
        } else if !self.exists(handle) {
            ERROR_INVALID_WINDOW_HANDLE
        } else {
            return Ok(());
        };
        Err(LauncherError::WindowOperation {
            operation,
            handle: handle.raw(),
            code,
        })
    }
}

/// Parks the thread that makes a held window call until released.
#[derive(Default)]
pub struct OperationHold {
    /// `(entered, released)`
    flags: Mutex<(bool, bool)>,
    changed: Condvar,
}

impl OperationHold {
    fn enter(&self) {
        let mut flags = lock(&self.flags);
        flags.0 = true;
        self.changed.notify_all();
        while !flags.1 {
            flags = self
                .changed
                .wait(flags)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Block until a caller is parked in the held operation.
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        let flags = lock(&self.flags);
        let (flags, _) = self
            .changed
            .wait_timeout_while(flags, timeout, |flags| !flags.0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        flags.0
    }

    pub fn release(&self) {
        lock(&self.flags).1 = true;
        self.changed.notify_all();
    }
}

/// [`WindowSystem`] over a window table held in memory.
#[derive(Default)]
pub struct SimWindowSystem {
    state: Mutex<SimState>,
    holds: Mutex<HashMap<&'static str, Arc<OperationHold>>>,
}

impl SimWindowSystem {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                next_handle: 0x1000,
                ..SimState::default()
            }),
            holds: Mutex::new(HashMap::new()),
        }
    }

    /// Park the next call of `operation` until the returned hold is released.
    pub fn hold_next(&self, operation: &'static str) -> Arc<OperationHold> {
        let hold = Arc::new(OperationHold::default());
        lock(&self.holds).insert(operation, hold.clone());
        hold
    }

    fn pass(&self, operation: &'static str) {
        let hold = lock(&self.holds).remove(operation);
        if let Some(hold) = hold {
            hold.enter();
        }
    }

    fn insert(&self, pid: u32, title: &str, appear_after: u32) -> WindowHandle {
        let mut state = lock(&self.state);
        let handle = WindowHandle(state.next_handle);
        state.next_handle += 0x10;
        state.windows.insert(
            handle,
            SimWindow {
                pid,
                title: title.to_string(),
                style: TOP_LEVEL_STYLE,
                initial_style: TOP_LEVEL_STYLE,
                parent: None,
                rect: (100, 100, 640, 480),
                visible: true,
                destroyed: false,
                appear_after,
            },
        );
        state.order.push(handle);
        handle
    }

    /// A visible top-level window owned by `pid`.
    pub fn add_window(&self, pid: u32, title: &str) -> WindowHandle {
        self.insert(pid, title, 0)
    }

    /// A window that exists only once `enumerations` window enumerations
    /// have happened.
    pub fn add_window_after(&self, pid: u32, title: &str, enumerations: u32) -> WindowHandle {
        self.insert(pid, title, enumerations)
    }

    /// The launcher's own container window.
    pub fn add_host(&self) -> WindowHandle {
        self.insert(0, "MU Launcher", 0)
    }

    pub fn window(&self, handle: WindowHandle) -> Option<SimWindow> {
        lock(&self.state).windows.get(&handle).cloned()
    }

    pub fn set_visible(&self, handle: WindowHandle, visible: bool) {
        if let Some(window) = lock(&self.state).windows.get_mut(&handle) {
            window.visible = visible;
        }
    }

    pub fn destroy(&self, handle: WindowHandle) {
        if let Some(window) = lock(&self.state).windows.get_mut(&handle) {
            window.destroyed = true;
        }
    }

    /// Put the window's creation style back, as the game does on a mode switch.
    pub fn reset_style(&self, handle: WindowHandle) {
        if let Some(window) = lock(&self.state).windows.get_mut(&handle) {
            window.style = window.initial_style;
        }
    }

    /// Change the parent behind the launcher's back.
    pub fn force_parent(&self, handle: WindowHandle, parent: Option<WindowHandle>) {
        if let Some(window) = lock(&self.state).windows.get_mut(&handle) {
            window.parent = parent;
        }
    }

    /// Make every later call of `operation` fail.
    pub fn fail_operation(&self, operation: &'static str) {
        lock(&self.state).failing.insert(operation);
    }

    pub fn foreground(&self) -> Option<WindowHandle> {
        lock(&self.state).foreground
    }
}

impl WindowSystem for SimWindowSystem {
    fn supports_embedding(&self) -> bool {
        true
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        let mut state = lock(&self.state);
        state.enumerations += 1;
        state
            .order
            .iter()
            .copied()
            .filter(|&handle| state.exists(handle))
            .filter(|handle| state.windows[handle].parent.is_none())
            .collect()
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        lock(&self.state).exists(handle)
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        let state = lock(&self.state);
        state.exists(handle) && state.windows[&handle].visible
    }

    fn owner_pid(&self, handle: WindowHandle) -> Option<u32> {
        let state = lock(&self.state);
        state
            .exists(handle)
            .then(|| state.windows[&handle].pid)
    }

    fn title(&self, handle: WindowHandle) -> String {
        lock(&self.state)
            .windows
            .get(&handle)
            .map(|w| w.title.clone())
            .unwrap_or_default()
    }

    fn style(&self, handle: WindowHandle) -> Result<WindowStyle> {
        self.pass("GetWindowLong");
        let state = lock(&self.state);
        state.check("GetWindowLong", handle)?;
        Ok(state.windows[&handle].style)
    }

    fn set_style(&self, handle: WindowHandle, style: WindowStyle) -> Result<()> {
        let mut state = lock(&self.state);
        state.check("SetWindowLong", handle)?;
        if let Some(window) = state.windows.get_mut(&handle) {
            window.style = style;
        }
        Ok(())
    }

    fn parent(&self, handle: WindowHandle) -> Option<WindowHandle> {
        let state = lock(&self.state);
        if !state.exists(handle) {
            return None;
        }
        state.windows[&handle].parent
    }

    fn set_parent(&self, child: WindowHandle, parent: Option<WindowHandle>) -> Result<()> {
        self.pass("SetParent");
        let mut state = lock(&self.state);
        state.check("SetParent", child)?;
        if let Some(parent) = parent {
            state.check("SetParent", parent)?;
        }
        if let Some(window) = state.windows.get_mut(&child) {
            window.parent = parent;
        }
        Ok(())
    }

    fn place(&self, handle: WindowHandle, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let mut state = lock(&self.state);
        state.check("SetWindowPos", handle)?;
        if let Some(window) = state.windows.get_mut(&handle) {
            window.rect = (x, y, width, height);
            window.visible = true;
        }
        Ok(())
    }

    fn refresh_frame(&self, handle: WindowHandle) -> Result<()> {
        let mut state = lock(&self.state);
        state.check("SetWindowPos", handle)?;
        if let Some(window) = state.windows.get_mut(&handle) {
            window.visible = true;
        }
        Ok(())
    }

    fn bring_to_front(&self, handle: WindowHandle) -> Result<()> {
        let mut state = lock(&self.state);
        state.check("SetForegroundWindow", handle)?;
        state.foreground = Some(handle);
        Ok(())
    }
}

/// [`ProcessTable`] over a PID map held in memory.
#[derive(Default)]
pub struct FakeProcessTable {
    processes: Mutex<BTreeMap<u32, String>>,
}

impl FakeProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, pid: u32, name: &str) {
        lock(&self.processes).insert(pid, name.to_string());
    }

    pub fn remove(&self, pid: u32) -> bool {
        lock(&self.processes).remove(&pid).is_some()
    }
}

impl ProcessTable for FakeProcessTable {
    fn snapshot(&self) -> Vec<ProcessRecord> {
        lock(&self.processes)
            .iter()
            .map(|(&pid, name)| ProcessRecord {
                pid,
                executable_name: name.clone(),
                creation_time: u64::from(pid),
            })
            .collect()
    }

    fn is_alive(&self, pid: u32) -> bool {
        lock(&self.processes).contains_key(&pid)
    }
}

/// [`ProcessControl`] that records calls and updates a [`FakeProcessTable`].
pub struct FakeProcessControl {
    table: Arc<FakeProcessTable>,
    next_pid: AtomicU32,
    failing_kills: AtomicU32,
    spawned: Mutex<Vec<(PathBuf, PathBuf)>>,
    terminated: Mutex<Vec<u32>>,
    killed: Mutex<Vec<u32>>,
}

impl FakeProcessControl {
    /// PID handed to the first spawned process; later spawns count up.
    pub const FIRST_PID: u32 = 4000;

    pub fn new(table: Arc<FakeProcessTable>) -> Self {
        Self {
            table,
            next_pid: AtomicU32::new(Self::FIRST_PID),
            failing_kills: AtomicU32::new(0),
            spawned: Mutex::new(Vec::new()),
            terminated: Mutex::new(Vec::new()),
            killed: Mutex::new(Vec::new()),
        }
    }

    /// `(executable, working_dir)` of every spawn.
    pub fn spawned(&self) -> Vec<(PathBuf, PathBuf)> {
        lock(&self.spawned).clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        lock(&self.terminated).clone()
    }

    /// Successful kills.
    pub fn killed(&self) -> Vec<u32> {
        lock(&self.killed).clone()
    }

    /// Make the next `count` kills fail with access denied.
    pub fn fail_kills(&self, count: u32) {
        self.failing_kills.store(count, Ordering::SeqCst);
    }
}

impl ProcessControl for FakeProcessControl {
    fn spawn(&self, executable: &Path, working_dir: &Path) -> Result<u32> {
        let name = executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| LauncherError::SpawnFailed {
                executable: executable.to_path_buf(),
                message: "no file name".into(),
            })?;
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.table.add(pid, &name);
        lock(&self.spawned).push((executable.to_path_buf(), working_dir.to_path_buf()));
        Ok(pid)
    }

    fn terminate(&self, pid: u32, _grace: Duration) -> Result<bool> {
        lock(&self.terminated).push(pid);
        self.table.remove(pid);
        Ok(true)
    }

    fn kill(&self, pid: u32) -> Result<bool> {
        let failing = self
            .failing_kills
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(LauncherError::Other(format!(
                "Access denied killing PID {}",
                pid
            )));
        }
        lock(&self.killed).push(pid);
        self.table.remove(pid);
        Ok(true)
    }
}
