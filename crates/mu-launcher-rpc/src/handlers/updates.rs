//! Update handlers.

use super::get_str_param;
use crate::server::AppState;
use mu_launcher_core::{LauncherError, UpdateManifest};
use serde_json::{json, Value};

pub async fn check_for_updates(state: &AppState, params: &Value) -> mu_launcher_core::Result<Value> {
    let current = get_str_param(params, "current_version", "currentVersion").map(String::from);
    let check = state.api.check_for_updates(current).await;
    let mut response = serde_json::to_value(check)?;
    if let Some(fields) = response.as_object_mut() {
        fields.insert("success".into(), json!(true));
    }
    Ok(response)
}

/// Start an update from an explicit `manifest` param or the last check.
pub async fn apply_update(state: &AppState, params: &Value) -> mu_launcher_core::Result<Value> {
    let manifest = match params.get("manifest") {
        Some(Value::Null) | None => None,
        Some(value) => Some(
            serde_json::from_value::<UpdateManifest>(value.clone()).map_err(|e| {
                LauncherError::InvalidParams {
                    message: format!("Invalid manifest: {}", e),
                }
            })?,
        ),
    };
    state.api.apply_update(manifest)?;
    Ok(json!({"success": true, "started": true}))
}

pub async fn cancel_update(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let cancelled = state.api.cancel_update().await;
    Ok(json!({"success": cancelled}))
}
