//! Settings handlers.

use super::{require_object_param, require_u32_param};
use crate::server::AppState;
use serde_json::{json, Value};

pub async fn get_settings(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let settings = state.api.get_settings().await;
    Ok(json!({
        "success": true,
        "settings": settings,
    }))
}

pub async fn save_settings(state: &AppState, params: &Value) -> mu_launcher_core::Result<Value> {
    let partial = require_object_param(params, "settings", "settings")?.clone();
    state.api.save_settings(partial).await?;
    Ok(json!({"success": true}))
}

pub async fn apply_resolution(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let path = state.api.apply_resolution().await?;
    Ok(json!({
        "success": true,
        "path": path.to_string_lossy(),
    }))
}

pub async fn generate_registry_script(
    state: &AppState,
    params: &Value,
) -> mu_launcher_core::Result<Value> {
    let width = require_u32_param(params, "width", "width")?;
    let height = require_u32_param(params, "height", "height")?;
    let path = state.api.generate_registry_script(width, height)?;
    Ok(json!({
        "success": true,
        "path": path.to_string_lossy(),
    }))
}
