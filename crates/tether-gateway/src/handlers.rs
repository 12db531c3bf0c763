// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tether_session::CallbackOutcome;

use crate::server::GatewayState;

pub const MISSING_CODE_BODY: &str = "No code in url";
pub const COMPLETE_BODY: &str = "Authentication complete. You can return to Telegram.";
pub const REJECTED_BODY: &str = "Authentication failed. Please issue /start again.";

/// Query parameters of the provider redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Number of live chat sessions.
    pub sessions: usize,
}

/// GET {callback_path}?code=..&state=..
///
/// The correlation runs on its own task, so a closed connection cannot
/// cancel it. The body is plain text for the user's browser; details of a
/// rejection stay in the logs.
pub async fn auth_callback(
    State(state): State<GatewayState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    let outcome = state
        .correlator
        .spawn_complete(params.code, params.state)
        .await;

    match outcome {
        CallbackOutcome::MissingCode => (StatusCode::OK, MISSING_CODE_BODY),
        CallbackOutcome::SessionOpened { .. } => (StatusCode::OK, COMPLETE_BODY),
        CallbackOutcome::Rejected(reason) => {
            tracing::debug!(%reason, "callback rejected");
            (StatusCode::BAD_REQUEST, REJECTED_BODY)
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.registry.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            sessions: 3,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(json.contains("\"sessions\":3"));
    }

    #[test]
    fn callback_params_default_to_none() {
        let params = CallbackParams::default();
        assert!(params.code.is_none());
        assert!(params.state.is_none());
    }
}
