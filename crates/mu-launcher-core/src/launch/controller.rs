//! Launch, close and window focus for game clients.
//!
//! The controller is the single writer of the managed PID set. A launch
//! returns right after the spawn; when embedding applies, window discovery
//! continues in a background task and reports through events.

use crate::cancel::CancellationToken;
use crate::context::{LauncherContext, PlatformBackends};
use crate::error::{LauncherError, Result};
use crate::events::{EventBus, LauncherEvent};
use crate::launch::config::{LaunchConfig, Resolution};
use crate::launch::discovery::{discover, DiscoveryOutcome, DiscoveryState};
use crate::process::directory::names_match;
use crate::process::{ManagedPidSet, ProcessControl, ProcessDirectory, ProcessRecord};
use crate::window::{
    EmbeddingEngine, EmbeddingSupervisor, WindowHandle, WindowLocator, WindowSystem,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const MSG_LAUNCHED: &str = "Game launched successfully";
pub const MSG_LAUNCHED_EMBEDDING: &str = "Game launched (embedding window...)";

/// Result of [`LaunchController::launch`], shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOutcome {
    pub success: bool,
    pub message: String,
    pub pid: Option<u32>,
    /// Whether window discovery was scheduled.
    pub embedding: bool,
}

impl LaunchOutcome {
    fn launched(pid: u32, embedding: bool) -> Self {
        Self {
            success: true,
            message: if embedding {
                MSG_LAUNCHED_EMBEDDING
            } else {
                MSG_LAUNCHED
            }
            .to_string(),
            pid: Some(pid),
            embedding,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            pid: None,
            embedding: false,
        }
    }
}

struct DiscoveryTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct ControllerShared {
    managed: ManagedPidSet,
    events: EventBus,
    directory: ProcessDirectory,
    control: Arc<dyn ProcessControl>,
    windows: Arc<dyn WindowSystem>,
    supervisor: EmbeddingSupervisor,
    config: Mutex<LaunchConfig>,
    host: Mutex<Option<WindowHandle>>,
    target_size: Mutex<Option<Resolution>>,
    discovery: Mutex<Option<DiscoveryTask>>,
    reported_unmanaged: Mutex<HashSet<u32>>,
    launch_lock: tokio::sync::Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ControllerShared {
    fn config(&self) -> LaunchConfig {
        lock(&self.config).clone()
    }

    fn locator(&self, config: &LaunchConfig) -> WindowLocator {
        WindowLocator::with_auxiliary_patterns(self.windows.clone(), &config.auxiliary_patterns)
    }

    fn target_size(&self, config: &LaunchConfig) -> Resolution {
        lock(&self.target_size).unwrap_or(config.resolution)
    }

    fn take_discovery(&self) -> Option<DiscoveryTask> {
        lock(&self.discovery).take()
    }
}

/// Controls game client processes and the embedded window.
#[derive(Clone)]
pub struct LaunchController {
    shared: Arc<ControllerShared>,
}

impl LaunchController {
    pub fn new(context: &LauncherContext, backends: &PlatformBackends, config: LaunchConfig) -> Self {
        let supervisor = EmbeddingSupervisor::new(
            EmbeddingEngine::new(backends.windows.clone()),
            context.events.clone(),
        );
        Self::with_supervisor(context, backends, config, supervisor)
    }

    pub fn with_supervisor(
        context: &LauncherContext,
        backends: &PlatformBackends,
        config: LaunchConfig,
        supervisor: EmbeddingSupervisor,
    ) -> Self {
        Self {
            shared: Arc::new(ControllerShared {
                managed: context.managed.clone(),
                events: context.events.clone(),
                directory: ProcessDirectory::new(backends.processes.clone()),
                control: backends.control.clone(),
                windows: backends.windows.clone(),
                supervisor,
                config: Mutex::new(config),
                host: Mutex::new(None),
                target_size: Mutex::new(None),
                discovery: Mutex::new(None),
                reported_unmanaged: Mutex::new(HashSet::new()),
                launch_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn managed(&self) -> &ManagedPidSet {
        &self.shared.managed
    }

    pub fn supervisor(&self) -> &EmbeddingSupervisor {
        &self.shared.supervisor
    }

    /// Replace the configuration used by operations that don't take one.
    pub fn update_config(&self, config: LaunchConfig) {
        *lock(&self.shared.config) = config;
    }

    pub fn config(&self) -> LaunchConfig {
        self.shared.config()
    }

    /// Register the UI container the game window is embedded into.
    pub fn attach_host(&self, host: WindowHandle) -> Result<()> {
        if !self.shared.windows.is_window(host) {
            return Err(LauncherError::InvalidParams {
                message: format!("host window {} does not exist", host),
            });
        }
        info!("Attached host window {}", host);
        *lock(&self.shared.host) = Some(host);
        Ok(())
    }

    pub fn host(&self) -> Option<WindowHandle> {
        *lock(&self.shared.host)
    }

    /// Launch a client.
    ///
    /// Never fails: rejections come back as `success: false` with the message
    /// to show.
    pub async fn launch(&self, config: LaunchConfig) -> LaunchOutcome {
        match self.try_launch(config).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Launch rejected: {}", e);
                LaunchOutcome::failed(e.to_string())
            }
        }
    }

    async fn try_launch(&self, config: LaunchConfig) -> Result<LaunchOutcome> {
        let _launching = self.shared.launch_lock.lock().await;

        config.validate()?;
        self.update_config(config.clone());
        let name = config
            .executable_name()
            .ok_or_else(|| LauncherError::ConfigInvalid {
                message: "game executable has no file name".into(),
            })?;

        let running = self.shared.directory.count_by_name(&name);
        if running >= config.process_limit as usize {
            return Err(LauncherError::InstanceLimitReached {
                limit: config.process_limit,
            });
        }

        if !config.executable.is_file() {
            return Err(LauncherError::ExecutableNotFound(config.executable.clone()));
        }

        let pid = self
            .shared
            .control
            .spawn(&config.executable, &config.working_dir())?;
        if !self.shared.directory.is_alive(pid) {
            return Err(LauncherError::SpawnFailed {
                executable: config.executable.clone(),
                message: format!("process {} exited immediately", pid),
            });
        }
        self.shared.managed.insert(pid);

        let host = self.host();
        let supported = self.shared.windows.supports_embedding();
        let embedding = config.embed && supported && host.is_some();
        if config.embed && !embedding {
            info!(
                "Embedding requested but unavailable (supported: {}, host attached: {}); launching detached",
                supported,
                host.is_some()
            );
        }

        info!(
            "Launched {} as PID {} ({} of {} running, embedding: {})",
            name,
            pid,
            running + 1,
            config.process_limit,
            embedding
        );
        self.shared
            .events
            .emit(LauncherEvent::GameLaunched { pid, embedding });

        if let (true, Some(host)) = (embedding, host) {
            self.start_discovery(pid, host, config).await;
        }
        Ok(LaunchOutcome::launched(pid, embedding))
    }

    async fn start_discovery(&self, pid: u32, host: WindowHandle, config: LaunchConfig) {
        self.cancel_discovery().await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_discovery(
            self.shared.clone(),
            pid,
            host,
            config,
            token.clone(),
        ));
        *lock(&self.shared.discovery) = Some(DiscoveryTask { token, handle });
    }

    /// Cancel a pending discovery and wait for it to finish.
    async fn cancel_discovery(&self) {
        if let Some(task) = self.shared.take_discovery() {
            task.token.cancel();
            task.handle.abort();
            // JoinError here only reports the abort
            let _ = task.handle.await;
        }
    }

    /// Close every managed client.
    ///
    /// Discovery and supervision stop first, so no tick touches a window
    /// that is being torn down. Returns true when at least one process was
    /// terminated.
    pub async fn close(&self) -> bool {
        self.cancel_discovery().await;
        self.shared.supervisor.stop().await;

        let grace = self.shared.config().terminate_grace;
        let mut closed = 0;
        for pid in self.shared.managed.pids() {
            let control = self.shared.control.clone();
            let result = tokio::task::spawn_blocking(move || control.terminate(pid, grace)).await;
            match result {
                Ok(Ok(true)) => {
                    self.shared.managed.remove(pid);
                    closed += 1;
                }
                Ok(Ok(false)) => warn!("Process {} survived termination", pid),
                Ok(Err(e)) => warn!("Failed to terminate process {}: {}", pid, e),
                Err(e) => warn!("Termination task for {} failed: {}", pid, e),
            }
        }

        info!("Closed {} game process(es)", closed);
        closed > 0
    }

    /// Bring a client window to the foreground.
    ///
    /// Tries the embedded window, then the first window of any managed PID,
    /// then the first window of any process with the client's name.
    pub async fn bring_to_front(&self) -> bool {
        let config = self.shared.config();
        let target = match self.shared.supervisor.current_game().await {
            Some(game) => Some(game),
            None => {
                let locator = self.shared.locator(&config);
                locator
                    .find_for_any_pid(&self.shared.managed.pids())
                    .or_else(|| {
                        let name = config.executable_name()?;
                        let pids: Vec<u32> = self
                            .shared
                            .directory
                            .list_by_name(&name)
                            .iter()
                            .map(|record| record.pid)
                            .collect();
                        locator.find_for_any_pid(&pids)
                    })
                    .map(|window| window.handle)
            }
        };

        let Some(handle) = target else {
            debug!("No client window to bring to front");
            return false;
        };
        match self.shared.windows.bring_to_front(handle) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to bring {} to front: {}", handle, e);
                false
            }
        }
    }

    /// Running clients that this launcher did not spawn.
    pub fn list_unmanaged(&self) -> Vec<ProcessRecord> {
        let Some(name) = self.shared.config().executable_name() else {
            return Vec::new();
        };
        self.shared
            .directory
            .list_by_name(&name)
            .into_iter()
            .filter(|record| !self.shared.managed.contains(record.pid))
            .collect()
    }

    /// Kill an unmanaged client.
    ///
    /// The PID is re-checked first: it must still belong to a process with
    /// the client's name and must not be managed.
    pub async fn kill_unmanaged(&self, pid: u32) -> bool {
        if self.shared.managed.contains(pid) {
            warn!("Refusing to kill managed PID {} as unmanaged", pid);
            return false;
        }
        let Some(name) = self.shared.config().executable_name() else {
            return false;
        };
        match self.shared.directory.record(pid) {
            Some(record) if names_match(&record.executable_name, &name) => {}
            Some(record) => {
                warn!(
                    "Refusing to kill PID {}: now {} instead of {}",
                    pid, record.executable_name, name
                );
                return false;
            }
            None => {
                debug!("PID {} is already gone", pid);
                return false;
            }
        }

        let control = self.shared.control.clone();
        let killed = match tokio::task::spawn_blocking(move || control.kill(pid)).await {
            Ok(Ok(killed)) => killed,
            Ok(Err(e)) => {
                warn!("Failed to kill unmanaged PID {}: {}", pid, e);
                false
            }
            Err(e) => {
                warn!("Kill task for {} failed: {}", pid, e);
                false
            }
        };
        if killed {
            info!("Killed unmanaged client PID {}", pid);
            lock(&self.shared.reported_unmanaged).remove(&pid);
        }
        killed
    }

    /// Remember the target size and apply it to the embedded window.
    pub async fn set_target_size(&self, width: u32, height: u32) -> bool {
        *lock(&self.shared.target_size) = Some(Resolution::new(width, height));
        self.shared.supervisor.set_target_size(width, height).await
    }

    /// One pass of the background scan: prune exited managed PIDs and report
    /// unmanaged clients not reported before. Returns the newly reported ones.
    ///
    /// With `kill_unmanaged` set, every unmanaged client still running is
    /// killed, including ones a previous pass failed to kill.
    pub async fn scan_once(&self) -> Vec<ProcessRecord> {
        let directory = &self.shared.directory;
        self.shared.managed.prune_dead(|pid| directory.is_alive(pid));

        let unmanaged = self.list_unmanaged();
        let fresh: Vec<ProcessRecord> = {
            let mut reported = lock(&self.shared.reported_unmanaged);
            reported.retain(|pid| unmanaged.iter().any(|record| record.pid == *pid));
            unmanaged
                .iter()
                .filter(|record| reported.insert(record.pid))
                .cloned()
                .collect()
        };

        for record in &fresh {
            info!(
                "Detected unmanaged client {} (PID {})",
                record.executable_name, record.pid
            );
            self.shared
                .events
                .emit(LauncherEvent::UnmanagedProcessDetected {
                    process: record.clone(),
                });
        }

        if self.shared.config().kill_unmanaged {
            for record in &unmanaged {
                self.kill_unmanaged(record.pid).await;
            }
        }
        fresh
    }

    /// Stop background work without touching client processes.
    ///
    /// An embedded window is undocked so it outlives the host container.
    pub async fn shutdown(&self) {
        self.cancel_discovery().await;
        if let Some(state) = self.shared.supervisor.stop().await {
            let engine = self.shared.supervisor.engine();
            if engine.undock(state.game, state.original_style) {
                info!("Undocked window {} for shutdown", state.game);
            } else {
                warn!("Window {} could not be fully undocked on shutdown", state.game);
            }
        }
    }
}

async fn run_discovery(
    shared: Arc<ControllerShared>,
    pid: u32,
    host: WindowHandle,
    config: LaunchConfig,
    token: CancellationToken,
) {
    let locator = shared.locator(&config);
    let state = DiscoveryState::new(pid, config.discovery_attempts);
    let outcome = discover(
        &locator,
        &shared.directory,
        state,
        config.discovery_interval,
        &token,
    )
    .await;

    match outcome {
        DiscoveryOutcome::Found(window) => {
            if token.is_cancelled() {
                return;
            }
            let size = shared.target_size(&config);
            match shared
                .supervisor
                .embed_and_supervise(window.handle, host, size.width, size.height)
                .await
            {
                Ok(_) => shared.events.emit(LauncherEvent::WindowEmbedded {
                    pid,
                    handle: window.handle,
                }),
                Err(e) => {
                    warn!("Embedding window {} of PID {} failed: {}", window.handle, pid, e);
                    shared.events.emit(LauncherEvent::EmbedFailed {
                        pid,
                        message: e.to_string(),
                    });
                }
            }
        }
        DiscoveryOutcome::Exhausted { attempts } => {
            warn!(
                "No window found for PID {} after {} attempts; leaving it undocked",
                pid, attempts
            );
            shared
                .events
                .emit(LauncherEvent::WindowNotFound { pid, attempts });
        }
        DiscoveryOutcome::ProcessExited { attempts } => {
            info!("PID {} exited during window discovery (attempt {})", pid, attempts);
            shared.managed.remove(pid);
        }
        DiscoveryOutcome::Cancelled => debug!("Window discovery for PID {} cancelled", pid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedConfig;
    use crate::process::ProcessTable;
    use crate::testing::{FakeProcessControl, FakeProcessTable, SimWindowSystem};
    use crate::window::supervisor::TickOutcome;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    struct Fixture {
        _dir: TempDir,
        exe: PathBuf,
        sim: Arc<SimWindowSystem>,
        table: Arc<FakeProcessTable>,
        control: Arc<FakeProcessControl>,
        context: LauncherContext,
        controller: LaunchController,
    }

    impl Fixture {
        fn config(&self) -> LaunchConfig {
            LaunchConfig::new(&self.exe)
        }

        fn events(&self) -> broadcast::Receiver<LauncherEvent> {
            self.context.events.subscribe()
        }
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("main.exe");
        std::fs::write(&exe, b"MZ").unwrap();

        let sim = Arc::new(SimWindowSystem::new());
        let table = Arc::new(FakeProcessTable::new());
        let control = Arc::new(FakeProcessControl::new(table.clone()));
        let backends = PlatformBackends {
            processes: table.clone(),
            control: control.clone(),
            windows: sim.clone(),
        };
        let context = LauncherContext::with_settings(
            dir.path(),
            crate::settings::SettingsStore::with_defaults(dir.path().join("config.json")),
        );
        let controller = LaunchController::new(&context, &backends, LaunchConfig::new(&exe));

        Fixture {
            _dir: dir,
            exe,
            sim,
            table,
            control,
            context,
            controller,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<LauncherEvent>) -> Vec<LauncherEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_launch() {
        let f = fixture();

        let outcome = f.controller.launch(f.config()).await;

        assert!(outcome.success);
        assert_eq!(outcome.message, MSG_LAUNCHED);
        let pid = outcome.pid.unwrap();
        assert!(f.controller.managed().contains(pid));
        assert_eq!(f.control.spawned().len(), 1);
        assert_eq!(f.control.spawned()[0].1, f.exe.parent().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_instance_cap_rejects_without_spawning() {
        let f = fixture();
        for pid in [1, 2, 3] {
            f.table.add(pid, "main.exe");
        }

        let outcome = f.controller.launch(f.config()).await;

        assert_eq!(
            outcome,
            LaunchOutcome {
                success: false,
                message: "Max clients reached (3)".to_string(),
                pid: None,
                embedding: false,
            }
        );
        assert!(f.control.spawned().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_executable() {
        let f = fixture();
        let missing = f.exe.with_file_name("absent.exe");

        let outcome = f.controller.launch(LaunchConfig::new(&missing)).await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("not found"));
        assert!(outcome.message.contains("absent.exe"));
        assert!(f.controller.managed().is_empty());
        assert!(f.control.spawned().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_is_rejected() {
        let f = fixture();
        let outcome = f
            .controller
            .launch(f.config().with_process_limit(0))
            .await;
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Invalid launch configuration"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_embed_requested_without_host_launches_detached() {
        let f = fixture();

        let outcome = f.controller.launch(f.config().with_embed(true)).await;

        assert!(outcome.success);
        assert!(!outcome.embedding);
        assert_eq!(outcome.message, MSG_LAUNCHED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_embedded_launch_discovers_and_supervises() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        let game = f.sim.add_window_after(FakeProcessControl::FIRST_PID, "MU", 3);
        let mut rx = f.events();

        let outcome = f.controller.launch(f.config().with_embed(true)).await;
        assert_eq!(outcome.message, MSG_LAUNCHED_EMBEDDING);
        assert!(outcome.embedding);

        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 4).await;

        assert_eq!(f.controller.supervisor().current_game().await, Some(game));
        assert_eq!(f.sim.window(game).unwrap().parent, Some(host));
        assert_eq!(f.sim.window(game).unwrap().rect, (0, 0, 1920, 1080));
        let events = drain(&mut rx);
        assert!(events.contains(&LauncherEvent::WindowEmbedded {
            pid: FakeProcessControl::FIRST_PID,
            handle: game
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_exhaustion_leaves_process_undocked() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        let mut rx = f.events();

        let outcome = f.controller.launch(f.config().with_embed(true)).await;
        assert!(outcome.success);

        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 12).await;

        assert!(f.controller.supervisor().state().await.is_none());
        assert!(f.controller.managed().contains(outcome.pid.unwrap()));
        let events = drain(&mut rx);
        assert!(events.contains(&LauncherEvent::WindowNotFound {
            pid: outcome.pid.unwrap(),
            attempts: 10
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_exit_during_discovery_prunes_pid() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();

        let outcome = f.controller.launch(f.config().with_embed(true)).await;
        let pid = outcome.pid.unwrap();
        f.table.remove(pid);

        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 2).await;

        assert!(!f.controller.managed().contains(pid));
    }

    #[tokio::test(start_paused = true)]
    async fn test_embed_failure_emits_event() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        f.sim.add_window(FakeProcessControl::FIRST_PID, "MU");
        f.sim.fail_operation("SetParent");
        let mut rx = f.events();

        f.controller.launch(f.config().with_embed(true)).await;
        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 2).await;

        assert!(f.controller.supervisor().state().await.is_none());
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, LauncherEvent::EmbedFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_clears_state_and_terminates() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        let game = f.sim.add_window(FakeProcessControl::FIRST_PID, "MU");
        f.controller.launch(f.config().with_embed(true)).await;
        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 2).await;
        assert!(f.controller.supervisor().is_embedded().await);

        assert!(f.controller.close().await);

        assert!(f.controller.supervisor().state().await.is_none());
        assert!(f.controller.managed().is_empty());
        assert_eq!(f.control.terminated(), vec![FakeProcessControl::FIRST_PID]);

        // Ticks after close leave a drifted window alone
        f.sim.reset_style(game);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(f.sim.window(game).unwrap().style.is_drifted());
        assert_eq!(
            f.controller.supervisor().tick_now().await,
            TickOutcome::Inactive
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_without_clients() {
        let f = fixture();
        assert!(!f.controller.close().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_during_discovery_cancels_it() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        let game = f.sim.add_window_after(FakeProcessControl::FIRST_PID, "MU", 2);

        f.controller.launch(f.config().with_embed(true)).await;
        f.controller.close().await;
        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 5).await;

        assert!(f.controller.supervisor().state().await.is_none());
        assert_eq!(f.sim.window(game).unwrap().parent, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_unmanaged_excludes_managed_and_other_names() {
        let f = fixture();
        f.table.add(10, "main.exe");
        f.table.add(11, "other.exe");
        let outcome = f.controller.launch(f.config()).await;
        let managed = outcome.pid.unwrap();

        let unmanaged: Vec<u32> = f.controller.list_unmanaged().iter().map(|r| r.pid).collect();

        assert_eq!(unmanaged, vec![10]);
        assert!(!unmanaged.contains(&managed));
        assert!(!unmanaged.contains(&11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_unmanaged_rechecks_identity() {
        let f = fixture();
        f.table.add(10, "main.exe");
        f.table.add(11, "explorer.exe");
        let managed = f.controller.launch(f.config()).await.pid.unwrap();

        assert!(!f.controller.kill_unmanaged(managed).await);
        assert!(!f.controller.kill_unmanaged(11).await);
        assert!(!f.controller.kill_unmanaged(999).await);
        assert!(f.controller.kill_unmanaged(10).await);

        assert_eq!(f.control.killed(), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_reports_each_unmanaged_once() {
        let f = fixture();
        f.table.add(10, "main.exe");
        let mut rx = f.events();

        let first = f.controller.scan_once().await;
        let second = f.controller.scan_once().await;

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(
            drain(&mut rx)
                .iter()
                .filter(|e| matches!(e, LauncherEvent::UnmanagedProcessDetected { .. }))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_prunes_dead_and_kills_when_configured() {
        let f = fixture();
        let pid = f.controller.launch(f.config()).await.pid.unwrap();
        f.table.remove(pid);
        f.table.add(10, "main.exe");
        f.controller.update_config(LaunchConfig {
            kill_unmanaged: true,
            ..f.config()
        });

        f.controller.scan_once().await;

        assert!(!f.controller.managed().contains(pid));
        assert_eq!(f.control.killed(), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_retries_kill_that_failed() {
        let f = fixture();
        f.table.add(10, "main.exe");
        f.control.fail_kills(1);
        f.controller.update_config(LaunchConfig {
            kill_unmanaged: true,
            ..f.config()
        });
        let mut rx = f.events();

        let first = f.controller.scan_once().await;
        assert_eq!(first.len(), 1);
        assert!(f.table.is_alive(10));

        let second = f.controller.scan_once().await;
        assert!(second.is_empty());
        assert!(!f.table.is_alive(10));
        assert_eq!(f.control.killed(), vec![10]);
        assert_eq!(
            drain(&mut rx)
                .iter()
                .filter(|e| matches!(e, LauncherEvent::UnmanagedProcessDetected { .. }))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_undocks_embedded_window_and_keeps_client() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        let game = f.sim.add_window(FakeProcessControl::FIRST_PID, "MU");
        let original = f.sim.window(game).unwrap().style;
        f.controller.launch(f.config().with_embed(true)).await;
        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 2).await;
        assert_eq!(f.sim.window(game).unwrap().parent, Some(host));

        f.controller.shutdown().await;

        let window = f.sim.window(game).unwrap();
        assert_eq!(window.parent, None);
        assert_eq!(window.style, original);
        assert!(window.visible);
        assert!(!f.controller.supervisor().is_embedded().await);
        assert!(f.table.is_alive(FakeProcessControl::FIRST_PID));
        assert!(f.control.terminated().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bring_to_front_prefers_managed_window() {
        let f = fixture();
        f.table.add(10, "main.exe");
        f.sim.add_window(10, "MU");
        let pid = f.controller.launch(f.config()).await.pid.unwrap();
        let managed_window = f.sim.add_window(pid, "MU");

        assert!(f.controller.bring_to_front().await);
        assert_eq!(f.sim.foreground(), Some(managed_window));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bring_to_front_falls_back_to_any_client() {
        let f = fixture();
        f.table.add(10, "main.exe");
        let other = f.sim.add_window(10, "MU");

        assert!(f.controller.bring_to_front().await);
        assert_eq!(f.sim.foreground(), Some(other));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bring_to_front_without_windows() {
        let f = fixture();
        assert!(!f.controller.bring_to_front().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_host_validates_handle() {
        let f = fixture();
        assert!(f.controller.attach_host(WindowHandle(0xdead)).is_err());
        assert!(f.controller.host().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_target_size_used_for_next_embed() {
        let f = fixture();
        let host = f.sim.add_host();
        f.controller.attach_host(host).unwrap();
        let game = f.sim.add_window(FakeProcessControl::FIRST_PID, "MU");

        assert!(!f.controller.set_target_size(1366, 768).await);
        f.controller.launch(f.config().with_embed(true)).await;
        tokio::time::sleep(EmbedConfig::DISCOVERY_INTERVAL * 2).await;

        assert_eq!(f.sim.window(game).unwrap().rect, (0, 0, 1366, 768));
    }
}
