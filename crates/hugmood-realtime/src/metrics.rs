//! Gateway metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Gateway-level counters.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Connections accepted since start
    pub connections_total: AtomicU64,
    /// Connections currently registered
    pub connections_active: AtomicU64,
    /// Inbound frames
    pub messages_received: AtomicU64,
    /// Outbound frames queued
    pub messages_sent: AtomicU64,
    /// Requests answered with an error
    pub requests_failed: AtomicU64,
    /// Fan-out operations
    pub broadcasts_sent: AtomicU64,
    /// Connections evicted for inactivity
    pub connections_swept: AtomicU64,
}

impl GatewayMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted connection
    pub fn record_connect(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removed connection
    pub fn record_disconnect(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record an inbound frame
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` queued outbound frames
    pub fn record_sent(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a failed request
    pub fn record_request_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fan-out
    pub fn record_broadcast(&self) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an idle eviction
    pub fn record_swept(&self) {
        self.connections_swept.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
            connections_swept: self.connections_swept.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Connections accepted since start
    pub connections_total: u64,
    /// Connections currently registered
    pub connections_active: u64,
    /// Inbound frames
    pub messages_received: u64,
    /// Outbound frames queued
    pub messages_sent: u64,
    /// Requests answered with an error
    pub requests_failed: u64,
    /// Fan-out operations
    pub broadcasts_sent: u64,
    /// Connections evicted for inactivity
    pub connections_swept: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_never_underflows() {
        let metrics = GatewayMetrics::new();
        metrics.record_disconnect();
        metrics.record_connect();
        metrics.record_connect();
        metrics.record_disconnect();

        let snap = metrics.snapshot();
        assert_eq!(snap.connections_total, 2);
        assert_eq!(snap.connections_active, 1);
    }
}
