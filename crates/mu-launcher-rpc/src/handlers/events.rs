//! Event polling handler.

use crate::server::AppState;
use serde_json::{json, Value};

/// Drain the events buffered since the last poll.
pub async fn poll_events(state: &AppState, _params: &Value) -> mu_launcher_core::Result<Value> {
    let events = state.events.drain();
    Ok(json!({
        "success": true,
        "events": events,
    }))
}
