//! Best-effort fan-out of envelopes to connections.
//!
//! Nothing is acknowledged, retried, or persisted. Targets are resolved
//! against the registry at send time, so closed connections are skipped.

use std::sync::Arc;

use hugmood_core::types::{ConnectionId, UserId};

use crate::connection::ConnectionRegistry;
use crate::message::{Envelope, codec};
use crate::metrics::GatewayMetrics;

/// Delivers envelopes to one connection, one user, or everyone else.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<GatewayMetrics>,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Deliver to one connection if it is still registered and writable.
    pub fn send_to_connection(&self, id: ConnectionId, envelope: &Envelope) -> bool {
        let Some(conn) = self.registry.find(id) else {
            tracing::debug!(conn_id = %id, message_type = %envelope.kind, "Target connection is gone, dropping");
            return false;
        };
        let Some(text) = codec::encode(envelope) else {
            return false;
        };
        let sent = conn.handle.send_text(text);
        if sent {
            self.metrics.record_sent(1);
        }
        sent
    }

    /// Deliver to every connection of `user_id`.
    ///
    /// Returns whether at least one connection accepted the frame.
    pub fn send_to_user(&self, user_id: &UserId, envelope: &Envelope) -> bool {
        let targets = self.registry.find_by_user(user_id);
        if targets.is_empty() {
            tracing::debug!(user_id = %user_id, message_type = %envelope.kind, "User has no live connections");
            return false;
        }
        let Some(text) = codec::encode(envelope) else {
            return false;
        };

        let mut delivered = 0u64;
        for id in targets {
            if let Some(conn) = self.registry.find(id) {
                if conn.handle.send_text(text.clone()) {
                    delivered += 1;
                }
            }
        }
        self.metrics.record_sent(delivered);
        delivered > 0
    }

    /// Deliver to every authenticated connection not bound to `excluded`.
    ///
    /// Returns the number of connections that accepted the frame.
    pub fn broadcast_except(&self, excluded: &UserId, envelope: &Envelope) -> usize {
        let Some(text) = codec::encode(envelope) else {
            return 0;
        };

        let mut delivered = 0usize;
        for conn in self.registry.all_authenticated() {
            if conn.user_id.as_ref() == Some(excluded) {
                continue;
            }
            if conn.handle.send_text(text.clone()) {
                delivered += 1;
            }
        }

        self.metrics.record_broadcast();
        self.metrics.record_sent(delivered as u64);
        tracing::debug!(
            excluded = %excluded,
            message_type = %envelope.kind,
            delivered,
            "Broadcast sent"
        );
        delivered
    }

    /// Announce a presence change to everyone else.
    pub fn announce_presence(&self, user_id: &UserId, online: bool) -> usize {
        self.broadcast_except(user_id, &crate::message::builder::user_status(user_id, online))
    }
}
