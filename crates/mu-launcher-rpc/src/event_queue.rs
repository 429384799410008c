//! Buffer between the core's event bus and `poll_events`.

use mu_launcher_core::LauncherEvent;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Events kept for the shell between polls; the oldest are dropped first.
const QUEUE_CAPACITY: usize = 256;

/// Bounded FIFO of events waiting for the next `poll_events`.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<LauncherEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LauncherEvent>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, event: LauncherEvent) {
        let mut queue = self.lock();
        if queue.len() >= QUEUE_CAPACITY {
            queue.pop_front();
        }
        queue.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<LauncherEvent> {
        self.lock().drain(..).collect()
    }

    /// Forward everything from `receiver` into this queue until the bus closes.
    pub fn forward_from(&self, mut receiver: broadcast::Receiver<LauncherEvent>) -> JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => queue.push(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event forwarder lagged, {} event(s) dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Event forwarder stopped");
        })
    }
}
