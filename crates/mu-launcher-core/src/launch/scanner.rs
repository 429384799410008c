//! Periodic sweep for exited managed clients and new unmanaged ones.

use crate::cancel::CancellationToken;
use crate::launch::LaunchController;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to the running background scan.
pub struct BackgroundScan {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackgroundScan {
    /// Run [`LaunchController::scan_once`] every `interval`, first after one
    /// interval.
    pub fn spawn(controller: LaunchController, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        controller.scan_once().await;
                    }
                }
            }
            debug!("Background scan stopped");
        });
        Self { token, handle }
    }

    pub fn stop(&self) {
        self.token.cancel();
        self.handle.abort();
    }
}

impl Drop for BackgroundScan {
    fn drop(&mut self) {
        self.stop();
    }
}
