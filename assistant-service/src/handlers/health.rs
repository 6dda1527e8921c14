use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint for liveness probes.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "assistant-service",
            "version": env!("CARGO_PKG_VERSION"),
            "active_sessions": state.store.len()
        })),
    )
}

/// Readiness check endpoint.
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}
