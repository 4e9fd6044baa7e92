//! Real-time gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound queue depth per connection. Messages beyond this are dropped.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Inactivity after which the sweeper evicts a connection, in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Period of the liveness sweeper, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Upper bound for a single request's downstream work, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Largest inbound frame accepted, in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Mood streak lengths that trigger a milestone notification.
    #[serde(default = "default_streak_milestones")]
    pub streak_milestones: Vec<u32>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            idle_timeout_seconds: default_idle_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
            request_timeout_seconds: default_request_timeout(),
            max_message_bytes: default_max_message_bytes(),
            streak_milestones: default_streak_milestones(),
        }
    }
}

impl RealtimeConfig {
    /// Idle threshold as a `Duration`.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Sweep period as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_idle_timeout() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    5 * 60
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_message_bytes() -> usize {
    65_536
}

fn default_streak_milestones() -> Vec<u32> {
    vec![3, 7, 14, 30, 60, 100]
}
