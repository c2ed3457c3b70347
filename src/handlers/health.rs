use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::AppState;

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "service": "predict-telemetry",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Readiness check endpoint
/// Reports how many telemetry entries are waiting for the next flush
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let pending = state.pipeline.pending_len();
    (StatusCode::OK, Json(json!({
        "status": "ready",
        "service": "predict-telemetry",
        "pending_telemetry": pending,
        "flush_threshold": state.pipeline.flusher().threshold(),
    })))
}
