//! Bounded polling for a freshly spawned client's window.

use crate::cancel::CancellationToken;
use crate::process::ProcessDirectory;
use crate::window::{ResolvedWindow, WindowLocator};
use std::time::Duration;
use tracing::debug;

/// Progress of one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryState {
    pub pid: u32,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl DiscoveryState {
    pub fn new(pid: u32, max_attempts: u32) -> Self {
        Self {
            pid,
            attempt: 0,
            max_attempts,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Found(ResolvedWindow),
    Exhausted { attempts: u32 },
    /// The process exited before presenting a window.
    ProcessExited { attempts: u32 },
    Cancelled,
}

/// Poll for the primary window of `state.pid`, waiting `interval` before each
/// attempt, until found, exhausted, exited or cancelled.
pub async fn discover(
    locator: &WindowLocator,
    directory: &ProcessDirectory,
    mut state: DiscoveryState,
    interval: Duration,
    token: &CancellationToken,
) -> DiscoveryOutcome {
    while !state.exhausted() {
        tokio::select! {
            _ = token.cancelled() => return DiscoveryOutcome::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }
        state.attempt += 1;

        if !directory.is_alive(state.pid) {
            return DiscoveryOutcome::ProcessExited {
                attempts: state.attempt,
            };
        }
        if let Some(window) = locator.find_primary_window(state.pid) {
            debug!(
                "Found window {} for PID {} on attempt {}/{}",
                window.handle, state.pid, state.attempt, state.max_attempts
            );
            return DiscoveryOutcome::Found(window);
        }
        debug!(
            "No window yet for PID {} (attempt {}/{})",
            state.pid, state.attempt, state.max_attempts
        );
    }

    DiscoveryOutcome::Exhausted {
        attempts: state.attempt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProcessTable, SimWindowSystem};
    use std::sync::Arc;

    struct Fixture {
        sim: Arc<SimWindowSystem>,
        table: Arc<FakeProcessTable>,
        locator: WindowLocator,
        directory: ProcessDirectory,
    }

    fn fixture() -> Fixture {
        let sim = Arc::new(SimWindowSystem::new());
        let table = Arc::new(FakeProcessTable::new());
        table.add(1000, "main.exe");
        Fixture {
            locator: WindowLocator::new(sim.clone()),
            directory: ProcessDirectory::new(table.clone()),
            sim,
            table,
        }
    }

    const INTERVAL: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn test_finds_window_that_appears_late() {
        let f = fixture();
        let game = f.sim.add_window_after(1000, "MU", 3);

        let start = tokio::time::Instant::now();
        let outcome = discover(
            &f.locator,
            &f.directory,
            DiscoveryState::new(1000, 10),
            INTERVAL,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(
            outcome,
            DiscoveryOutcome::Found(ResolvedWindow {
                handle: game,
                pid: 1000
            })
        );
        assert_eq!(start.elapsed(), INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempt_budget() {
        let f = fixture();

        let outcome = discover(
            &f.locator,
            &f.directory,
            DiscoveryState::new(1000, 10),
            INTERVAL,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, DiscoveryOutcome::Exhausted { attempts: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_process_exits() {
        let f = fixture();
        f.table.remove(1000);

        let outcome = discover(
            &f.locator,
            &f.directory,
            DiscoveryState::new(1000, 10),
            INTERVAL,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, DiscoveryOutcome::ProcessExited { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let f = fixture();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = discover(
            &f.locator,
            &f.directory,
            DiscoveryState::new(1000, 10),
            INTERVAL,
            &token,
        )
        .await;

        assert_eq!(outcome, DiscoveryOutcome::Cancelled);
    }
}
