// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::{Router, routing::get};
use tether_core::TetherError;
use tether_session::{AuthCorrelator, SessionRegistry};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Turns provider redirects into sessions.
    pub correlator: Arc<AuthCorrelator>,
    /// Live sessions, reported by the health endpoint.
    pub registry: SessionRegistry,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors GatewayConfig from tether-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path of the OAuth redirect target.
    pub callback_path: String,
}

/// Routes:
/// - GET `{callback_path}`
/// - GET /health
pub fn router(state: GatewayState, callback_path: &str) -> Router {
    Router::new()
        .route(callback_path, get(handlers::auth_callback))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind to `host:port` and serve until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), TetherError> {
    let app = router(state, &config.callback_path);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TetherError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(callback = %config.callback_path, "gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| TetherError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server stopped");
    Ok(())
}
