use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::AppState;

/// HealthResponse
///
/// Liveness payload for load balancers and monitoring.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether session token signatures are verified or only their structure.
    pub token_mode: &'static str,
}

/// health
///
/// Answers directly from the gate service; never forwarded upstream.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let token_mode = if state.gate.decoder().verifies_signatures() {
        "verified"
    } else {
        "structural"
    };

    Json(HealthResponse {
        status: "ok",
        token_mode,
    })
}
