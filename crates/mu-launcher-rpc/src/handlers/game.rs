//! Game client handlers.

use super::{get_i64_param, require_u32_param};
use crate::server::AppState;
use mu_launcher_core::{LauncherError, WindowHandle};
use serde_json::{json, Value};

pub async fn launch_game(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let outcome = state.api.launch_game().await;
    Ok(serde_json::to_value(outcome)?)
}

pub async fn close_game(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let closed = state.api.close_game().await;
    Ok(json!({"success": closed}))
}

pub async fn bring_to_front(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let focused = state.api.bring_to_front().await;
    Ok(json!({"success": focused}))
}

pub async fn list_unmanaged(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let processes = state.api.list_unmanaged();
    Ok(json!({
        "success": true,
        "processes": processes,
    }))
}

pub async fn kill_unmanaged(state: &AppState, params: &Value) -> mu_launcher_core::Result<Value> {
    let pid = require_u32_param(params, "pid", "pid")?;
    let killed = state.api.kill_unmanaged(pid).await;
    Ok(json!({"success": killed}))
}

pub async fn set_target_size(state: &AppState, params: &Value) -> mu_launcher_core::Result<Value> {
    let width = require_u32_param(params, "width", "width")?;
    let height = require_u32_param(params, "height", "height")?;
    if width == 0 || height == 0 {
        return Err(LauncherError::InvalidParams {
            message: format!("Invalid target size {}x{}", width, height),
        });
    }
    let applied = state.api.set_target_size(width, height).await;
    Ok(json!({"success": true, "applied": applied}))
}

pub async fn attach_host(state: &AppState, params: &Value) -> mu_launcher_core::Result<Value> {
    let raw = get_i64_param(params, "handle", "hwnd").ok_or_else(|| LauncherError::InvalidParams {
        message: "Missing required parameter: handle".into(),
    })?;
    let handle = isize::try_from(raw).map_err(|_| LauncherError::InvalidParams {
        message: format!("Window handle {} out of range", raw),
    })?;
    state.api.attach_host(WindowHandle(handle))?;
    Ok(json!({"success": true}))
}
