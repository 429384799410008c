//! Components owned by a [`crate::LauncherApi`].

use crate::context::LauncherContext;
use crate::launch::{BackgroundScan, LaunchController};
use crate::update::UpdateManager;
use std::sync::Mutex;

pub(crate) struct ApiState {
    pub(crate) context: LauncherContext,
    pub(crate) controller: LaunchController,
    pub(crate) updates: UpdateManager,
    pub(crate) scan: Mutex<Option<BackgroundScan>>,
}

impl ApiState {
    /// Stop the background scan, if it runs.
    pub(crate) fn stop_scan(&self) {
        let scan = self
            .scan
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(scan) = scan {
            scan.stop();
        }
    }
}
