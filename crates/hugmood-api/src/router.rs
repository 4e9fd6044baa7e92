//! Route table.

use axum::Router;
use axum::routing::get;

use crate::error::not_found;
use crate::handlers::{health, ws};
use crate::state::AppState;

/// Builds the router: the WebSocket endpoint at the configured path plus the
/// health probe.
pub fn build_router(state: AppState) -> Router {
    let ws_path = state.config.server.ws_path.clone();
    Router::new()
        .route(&ws_path, get(ws::ws_handler))
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::health_detailed))
        .fallback(not_found)
        .with_state(state)
}
