//! Keeps an embedded window embedded.
//!
//! The supervisor owns the single [`EmbeddingState`]. While embedded, a tokio
//! task reconciles once per interval: a destroyed window ends supervision, a
//! window that regained top-level styling or left the host is re-embedded,
//! and a failed re-embed falls back to undocking.
//!
//! Every operation that touches the state (embed, tick, resize, stop) takes
//! the same async mutex, so a `stop()` issued during an in-flight tick waits
//! for it and no tick observes a half-cleared state.

use crate::cancel::CancellationToken;
use crate::config::EmbedConfig;
use crate::error::{LauncherError, Result};
use crate::events::{EventBus, LauncherEvent};
use crate::window::{EmbedReport, EmbeddingEngine, WindowHandle, WindowStyle};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The one embedded window and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingState {
    pub game: WindowHandle,
    pub host: WindowHandle,
    pub target_width: u32,
    pub target_height: u32,
    /// Style before the first embed, restored on undock.
    pub original_style: Option<WindowStyle>,
}

/// Lifecycle of the embedding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPhase {
    Unembedded,
    Embedding,
    Embedded,
}

/// What a reconciliation tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is embedded, or the tick belongs to a stopped supervision.
    Inactive,
    Healthy,
    /// Drift was detected and the window re-embedded.
    Restored,
    /// Supervision ended and `EmbeddingLost` was emitted.
    Lost,
}

struct Inner {
    phase: EmbedPhase,
    state: Option<EmbeddingState>,
    generation: u64,
}

struct SupervisionTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SupervisionTask {
    fn shutdown(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

struct Shared {
    engine: EmbeddingEngine,
    events: EventBus,
    interval: Duration,
    inner: Mutex<Inner>,
    task: StdMutex<Option<SupervisionTask>>,
}

impl Shared {
    fn replace_task(&self, task: Option<SupervisionTask>) {
        let previous = match self.task.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, task),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), task),
        };
        if let Some(previous) = previous {
            previous.shutdown();
        }
    }
}

/// Owner of the embedding state and its reconciliation task.
pub struct EmbeddingSupervisor {
    shared: Arc<Shared>,
}

impl EmbeddingSupervisor {
    pub fn new(engine: EmbeddingEngine, events: EventBus) -> Self {
        Self::with_interval(engine, events, EmbedConfig::RECONCILE_INTERVAL)
    }

    pub fn with_interval(engine: EmbeddingEngine, events: EventBus, interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                events,
                interval,
                inner: Mutex::new(Inner {
                    phase: EmbedPhase::Unembedded,
                    state: None,
                    generation: 0,
                }),
                task: StdMutex::new(None),
            }),
        }
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        &self.shared.engine
    }

    /// Embed `game` into `host` and start supervising it.
    ///
    /// Any previous supervision is stopped first. On failure the window is
    /// undocked and [`LauncherError::EmbedFailed`] is returned.
    pub async fn embed_and_supervise(
        &self,
        game: WindowHandle,
        host: WindowHandle,
        width: u32,
        height: u32,
    ) -> Result<EmbedReport> {
        let mut inner = self.shared.inner.lock().await;
        inner.generation += 1;
        inner.state = None;
        inner.phase = EmbedPhase::Embedding;
        self.shared.replace_task(None);

        let windows = self.shared.engine.window_system();
        let original_style = windows.style(game).ok();
        let report = self.shared.engine.embed(game, host, width, height);

        if !report.success() {
            inner.phase = EmbedPhase::Unembedded;
            drop(inner);
            self.shared.engine.undock(game, original_style);
            let message = report
                .first_failure()
                .unwrap_or_else(|| "embedding did not complete".to_string());
            return Err(LauncherError::EmbedFailed { message });
        }

        self.start_locked(
            &mut inner,
            EmbeddingState {
                game,
                host,
                target_width: width,
                target_height: height,
                original_style,
            },
        );
        Ok(report)
    }

    /// Supervise a window that is already embedded.
    pub async fn start(&self, state: EmbeddingState) {
        let mut inner = self.shared.inner.lock().await;
        inner.generation += 1;
        self.start_locked(&mut inner, state);
    }

    fn start_locked(&self, inner: &mut Inner, state: EmbeddingState) {
        info!(
            "Supervising window {} in host {} every {:?}",
            state.game, state.host, self.shared.interval
        );
        inner.state = Some(state);
        inner.phase = EmbedPhase::Embedded;

        let generation = inner.generation;
        let token = CancellationToken::new();
        let handle = tokio::spawn(supervise(self.shared.clone(), generation, token.clone()));
        self.shared
            .replace_task(Some(SupervisionTask { token, handle }));
    }

    /// Stop supervising and clear the state.
    ///
    /// Waits for an in-flight tick. Once this returns, no tick has side
    /// effects. Returns the state that was cleared.
    pub async fn stop(&self) -> Option<EmbeddingState> {
        let mut inner = self.shared.inner.lock().await;
        inner.generation += 1;
        inner.phase = EmbedPhase::Unembedded;
        let previous = inner.state.take();
        self.shared.replace_task(None);
        if let Some(state) = &previous {
            info!("Stopped supervising window {}", state.game);
        }
        previous
    }

    /// Update the target size and apply it immediately when embedded.
    ///
    /// Returns true when an embedded window was resized.
    pub async fn set_target_size(&self, width: u32, height: u32) -> bool {
        let mut inner = self.shared.inner.lock().await;
        match inner.state.as_mut() {
            Some(state) => {
                state.target_width = width;
                state.target_height = height;
                self.shared.engine.resize(state.game, width, height)
            }
            None => false,
        }
    }

    /// Run one reconciliation now, regardless of the timer.
    pub async fn tick_now(&self) -> TickOutcome {
        reconcile(&self.shared, None).await
    }

    pub async fn phase(&self) -> EmbedPhase {
        self.shared.inner.lock().await.phase
    }

    pub async fn state(&self) -> Option<EmbeddingState> {
        self.shared.inner.lock().await.state.clone()
    }

    pub async fn current_game(&self) -> Option<WindowHandle> {
        self.shared.inner.lock().await.state.as_ref().map(|s| s.game)
    }

    pub async fn is_embedded(&self) -> bool {
        self.shared.inner.lock().await.state.is_some()
    }
}

impl Drop for EmbeddingSupervisor {
    fn drop(&mut self) {
        self.shared.replace_task(None);
    }
}

async fn supervise(shared: Arc<Shared>, generation: u64, token: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + shared.interval, shared.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                match reconcile(&shared, Some(generation)).await {
                    TickOutcome::Inactive | TickOutcome::Lost => break,
                    TickOutcome::Healthy | TickOutcome::Restored => {}
                }
            }
        }
    }
    debug!("Supervision task (generation {}) finished", generation);
}

/// One reconciliation pass. `expected` pins the tick to a supervision
/// generation; `None` runs against whatever is current.
async fn reconcile(shared: &Shared, expected: Option<u64>) -> TickOutcome {
    let mut inner = shared.inner.lock().await;
    if expected.is_some_and(|generation| generation != inner.generation) {
        return TickOutcome::Inactive;
    }
    let Some(state) = inner.state.clone() else {
        return TickOutcome::Inactive;
    };

    let windows = shared.engine.window_system();
    if !windows.is_window(state.game) || !windows.is_window(state.host) {
        info!(
            "Embedded window {} or host {} no longer exists, ending supervision",
            state.game, state.host
        );
        lose(&mut inner, shared, "window closed");
        return TickOutcome::Lost;
    }

    let style = windows.style(state.game);
    let parent = windows.parent(state.game);
    let drifted = match &style {
        Ok(style) => style.is_drifted() || parent != Some(state.host),
        Err(e) => {
            debug!("Could not read style of {}: {}", state.game, e);
            true
        }
    };
    if !drifted {
        return TickOutcome::Healthy;
    }

    warn!(
        "Window {} drifted (style {:?}, parent {:?}), re-embedding",
        state.game,
        style.as_ref().map(|s| s.to_string()).ok(),
        parent.map(|p| p.to_string())
    );
    let report = shared
        .engine
        .embed(state.game, state.host, state.target_width, state.target_height);
    if report.success() {
        return TickOutcome::Restored;
    }

    let reason = report
        .first_failure()
        .unwrap_or_else(|| "re-embed failed".to_string());
    lose(&mut inner, shared, &reason);
    shared.engine.undock(state.game, state.original_style);
    TickOutcome::Lost
}

fn lose(inner: &mut Inner, shared: &Shared, reason: &str) {
    inner.state = None;
    inner.phase = EmbedPhase::Unembedded;
    inner.generation += 1;
    shared.events.emit(LauncherEvent::EmbeddingLost {
        reason: reason.to_string(),
    });
}
