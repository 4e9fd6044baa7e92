//! Response DTOs.

use serde::{Deserialize, Serialize};

use hugmood_realtime::MetricsSnapshot;

/// Health probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Live WebSocket connections.
    pub clients: usize,
    /// Connections with a bound user.
    pub authenticated_clients: usize,
    /// Seconds since start.
    pub uptime_seconds: u64,
    /// Build version.
    pub version: String,
}

/// Detailed health probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    /// Summary fields.
    #[serde(flatten)]
    pub health: HealthResponse,
    /// Distinct users online.
    pub online_users: usize,
    /// Gateway counters.
    pub metrics: MetricsSnapshot,
}
