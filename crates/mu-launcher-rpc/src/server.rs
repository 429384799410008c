//! HTTP server implementation using Axum.

use crate::event_queue::EventQueue;
use crate::handlers::{handle_health, handle_rpc};
use axum::{
    routing::{get, post},
    Router,
};
use mu_launcher_core::{CancellationToken, LauncherApi};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Core API
    pub api: LauncherApi,
    /// Events waiting for the next `poll_events`
    pub events: EventQueue,
    /// Cancelled by the `shutdown` method
    pub shutdown: CancellationToken,
}

/// A running server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(api: LauncherApi, host: &str, port: u16) -> anyhow::Result<ServerHandle> {
    let events = EventQueue::new();
    events.forward_from(api.subscribe());

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        api,
        events,
        shutdown: shutdown.clone(),
    });

    // The shell loads the UI from a local origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_server_starts() {
        let temp_dir = TempDir::new().unwrap();
        let api = LauncherApi::builder(temp_dir.path())
            .background_scan(None)
            .build()
            .await
            .unwrap();

        let server = start_server(api, "127.0.0.1", 0).await.unwrap();
        assert!(server.addr.port() > 0);
        server.shutdown.cancel();
    }
}
