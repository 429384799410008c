//! Update methods on LauncherApi.

use crate::error::Result;
use crate::update::{UpdateCheck, UpdateManifest};
use crate::LauncherApi;

impl LauncherApi {
    /// Check the update server. `current_version` defaults to the `version`
    /// setting.
    pub async fn check_for_updates(&self, current_version: Option<String>) -> UpdateCheck {
        self.state.updates.check_for_updates(current_version).await
    }

    /// Start applying `manifest`, or the one found by the last check.
    pub fn apply_update(&self, manifest: Option<UpdateManifest>) -> Result<()> {
        self.state.updates.download_and_apply(manifest)
    }

    pub async fn cancel_update(&self) -> bool {
        self.state.updates.cancel_update().await
    }

    pub fn is_updating(&self) -> bool {
        self.state.updates.is_updating()
    }
}
