//! JSON-RPC request handlers, split by domain.

mod events;
mod game;
mod settings;
mod updates;

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mu_launcher_core::LauncherError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

// ============================================================================
// Parameter extraction helpers
// ============================================================================

fn param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a Value> {
    params.get(snake).or_else(|| params.get(camel))
}

fn missing(name: &str) -> LauncherError {
    LauncherError::InvalidParams {
        message: format!("Missing required parameter: {}", name),
    }
}

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    param(params, snake, camel).and_then(|v| v.as_str())
}

/// Extract an optional i64 parameter, supporting both snake_case and camelCase.
pub(crate) fn get_i64_param(params: &Value, snake: &str, camel: &str) -> Option<i64> {
    param(params, snake, camel).and_then(|v| v.as_i64())
}

/// Extract a required non-negative integer that fits in `u32`.
pub(crate) fn require_u32_param(params: &Value, snake: &str, camel: &str) -> mu_launcher_core::Result<u32> {
    let value = param(params, snake, camel).ok_or_else(|| missing(snake))?;
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| LauncherError::InvalidParams {
            message: format!("Parameter {} must be a non-negative integer, got {}", snake, value),
        })
}

/// Extract a required JSON object parameter.
pub(crate) fn require_object_param<'a>(
    params: &'a Value,
    snake: &str,
    camel: &str,
) -> mu_launcher_core::Result<&'a serde_json::Map<String, Value>> {
    let value = param(params, snake, camel).ok_or_else(|| missing(snake))?;
    value.as_object().ok_or_else(|| LauncherError::InvalidParams {
        message: format!("Parameter {} must be an object", snake),
    })
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    // Handle built-in methods
    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    if method == "shutdown" {
        info!("Shutdown requested by client");
        state.shutdown.cancel();
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(
                id,
                json!({"status": "shutting_down"}),
            )),
        );
    }

    match dispatch_method(&state, method, &params).await {
        Ok(value) => (StatusCode::OK, Json(JsonRpcResponse::success(id, value))),
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate domain handler.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> mu_launcher_core::Result<Value> {
    match method {
        // Game clients
        "launch_game" => game::launch_game(state, params).await,
        "close_game" => game::close_game(state, params).await,
        "bring_to_front" => game::bring_to_front(state, params).await,
        "list_unmanaged" => game::list_unmanaged(state, params).await,
        "kill_unmanaged" => game::kill_unmanaged(state, params).await,
        "set_target_size" => game::set_target_size(state, params).await,
        "attach_host" => game::attach_host(state, params).await,

        // Settings
        "get_settings" => settings::get_settings(state, params).await,
        "save_settings" => settings::save_settings(state, params).await,
        "apply_resolution" => settings::apply_resolution(state, params).await,
        "generate_registry_script" => settings::generate_registry_script(state, params).await,

        // Updates
        "check_for_updates" => updates::check_for_updates(state, params).await,
        "apply_update" => updates::apply_update(state, params).await,
        "cancel_update" => updates::cancel_update(state, params).await,

        // Events
        "poll_events" => events::poll_events(state, params).await,

        // Unknown method
        _ => {
            warn!("Method not found: {}", method);
            Err(LauncherError::Other(format!("Method not found: {}", method)))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
