//! Application state shared across all handlers.

use std::sync::Arc;

use hugmood_core::config::AppConfig;
use hugmood_realtime::GatewayEngine;

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Real-time gateway engine
    pub engine: GatewayEngine,
}

impl AppState {
    /// Bundle configuration and engine.
    pub fn new(config: AppConfig, engine: GatewayEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
