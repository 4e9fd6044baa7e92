//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

fn summary(state: &AppState) -> HealthResponse {
    let engine = &state.engine;
    HealthResponse {
        status: "ok".to_string(),
        clients: engine.registry.len(),
        authenticated_clients: engine.registry.authenticated_count(),
        uptime_seconds: engine.uptime().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(summary(&state))
}

/// GET /health/detailed
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    Json(DetailedHealthResponse {
        health: summary(&state),
        online_users: state.engine.registry.user_count(),
        metrics: state.engine.metrics.snapshot(),
    })
}
