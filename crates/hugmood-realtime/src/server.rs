//! Top-level gateway engine that ties together all subsystems.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use hugmood_core::config::RealtimeConfig;
use hugmood_core::types::ConnectionId;
use hugmood_services::Backends;

use crate::broadcast::Broadcaster;
use crate::connection::{CLOSE_GOING_AWAY, ConnectionHandle, ConnectionRegistry, Frame};
use crate::dispatch::Dispatcher;
use crate::error::RequestError;
use crate::message::{builder, codec};
use crate::metrics::{GatewayMetrics, MetricsSnapshot};
use crate::sweeper::Sweeper;

/// Close reason sent to every connection on shutdown.
pub const SHUTDOWN_CLOSE_REASON: &str = "Server shutting down";

/// Central gateway engine shared by every transport task.
#[derive(Clone)]
pub struct GatewayEngine {
    /// Connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Fan-out.
    pub broadcaster: Arc<Broadcaster>,
    /// Request routing.
    pub dispatcher: Arc<Dispatcher>,
    /// Metrics collector.
    pub metrics: Arc<GatewayMetrics>,
    config: Arc<RealtimeConfig>,
    started_at: Instant,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for GatewayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayEngine")
            .field("connections", &self.registry.len())
            .finish()
    }
}

/// Point-in-time gateway statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStats {
    /// Live connections.
    pub connections: usize,
    /// Authenticated connections.
    pub authenticated_connections: usize,
    /// Distinct users online.
    pub online_users: usize,
    /// Seconds since start.
    pub uptime_seconds: u64,
    /// Counters.
    pub metrics: MetricsSnapshot,
}

impl GatewayEngine {
    /// Creates the engine with the built-in request handlers.
    pub fn new(config: RealtimeConfig, backends: Backends) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let config = Arc::new(config);

        let metrics = Arc::new(GatewayMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone(), metrics.clone()));
        let dispatcher = Arc::new(Dispatcher::with_default_handlers(
            registry.clone(),
            broadcaster.clone(),
            backends,
            config.clone(),
            metrics.clone(),
        ));

        info!(
            handlers = ?dispatcher.registered_types(),
            "Gateway engine initialized"
        );

        Self {
            registry,
            broadcaster,
            dispatcher,
            metrics,
            config,
            started_at: Instant::now(),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Gateway settings.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Register a new transport and queue the greeting.
    ///
    /// The transport task drains the returned receiver into the socket.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let (handle, rx) = ConnectionHandle::channel(self.config.outbound_buffer_size);
        let id = self.registry.register(handle);
        self.metrics.record_connect();
        self.broadcaster
            .send_to_connection(id, &builder::connection_established());
        info!(conn_id = %id, "Connection accepted");
        (id, rx)
    }

    /// Process one inbound text frame.
    ///
    /// Malformed frames are answered with an error and leave the connection
    /// open. Returns the request task when one was spawned.
    pub fn handle_text(&self, id: ConnectionId, raw: &str) -> Option<JoinHandle<()>> {
        self.metrics.record_received();
        if !self.registry.touch(id) {
            debug!(conn_id = %id, "Frame from unregistered connection");
            return None;
        }

        match codec::decode(raw, self.config.max_message_bytes) {
            Ok(envelope) => {
                debug!(conn_id = %id, request_type = %envelope.kind, "Message received");
                self.dispatcher.dispatch(id, envelope)
            }
            Err(e) => {
                debug!(conn_id = %id, error = %e, "Rejected malformed frame");
                self.metrics.record_request_failed();
                let reply = builder::error(RequestError::from(e).to_string());
                self.broadcaster.send_to_connection(id, &reply);
                None
            }
        }
    }

    /// Remove a closed transport. Idempotent.
    ///
    /// Announces the user offline when this was their last connection.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let Some(removal) = self.registry.remove(id) else {
            return false;
        };
        self.metrics.record_disconnect();
        info!(
            conn_id = %id,
            user_id = ?removal.connection.user_id,
            "Connection closed"
        );

        if removal.user_offline {
            if let Some(user_id) = &removal.connection.user_id {
                self.broadcaster.announce_presence(user_id, false);
            }
        }
        true
    }

    /// A liveness sweeper over this engine's registry.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.registry.clone(),
            self.broadcaster.clone(),
            self.metrics.clone(),
            &self.config,
        )
    }

    /// Receiver that flips to `true` once shutdown starts.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stop background tasks and close every connection with 1001.
    pub fn shutdown(&self) -> usize {
        info!("Shutting down gateway engine");
        self.shutdown_tx.send_replace(true);

        let mut closed = 0;
        for conn in self.registry.all() {
            conn.handle.close(CLOSE_GOING_AWAY, SHUTDOWN_CLOSE_REASON);
            if self.registry.remove(conn.id).is_some() {
                self.metrics.record_disconnect();
                closed += 1;
            }
        }

        info!(closed, "Gateway engine shut down");
        closed
    }

    /// Time since the engine was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Current statistics.
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            connections: self.registry.len(),
            authenticated_connections: self.registry.authenticated_count(),
            online_users: self.registry.user_count(),
            uptime_seconds: self.uptime().as_secs(),
            metrics: self.metrics.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hugmood_services::mock::MockBackend;
    use serde_json::Value;

    fn engine() -> GatewayEngine {
        GatewayEngine::new(RealtimeConfig::default(), MockBackend::new().backends())
    }

    fn next_json(rx: &mut mpsc::Receiver<Frame>) -> Value {
        match rx.try_recv().unwrap() {
            Frame::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_sends_greeting() {
        let engine = engine();
        let (id, mut rx) = engine.connect();

        let greeting = next_json(&mut rx);
        assert_eq!(greeting["type"], "connection_established");
        assert_eq!(greeting["message"], "Connected to HugMood API");
        assert!(engine.registry.contains(id));
        assert_eq!(engine.stats().connections, 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_connection_open() {
        let engine = engine();
        let (id, mut rx) = engine.connect();
        next_json(&mut rx);

        for raw in ["not json", "[1,2]", r#"{"callbackId": "x"}"#] {
            assert!(engine.handle_text(id, raw).is_none());
            let reply = next_json(&mut rx);
            assert_eq!(reply["type"], "error");
            assert_eq!(reply["message"], "Invalid message format");
        }
        assert!(engine.registry.contains(id));
    }

    #[tokio::test]
    async fn test_anonymous_session_then_mood() {
        let engine = engine();
        let (id, mut rx) = engine.connect();
        next_json(&mut rx);

        engine
            .handle_text(id, r#"{"type":"authenticate","method":"anonymous"}"#)
            .unwrap()
            .await
            .unwrap();
        let auth = next_json(&mut rx);
        assert_eq!(auth["type"], "anonymous_login_success");
        assert_eq!(auth["userId"], "u1");

        engine
            .handle_text(id, r#"{"type":"update_mood","mood":"good","callbackId":"c1"}"#)
            .unwrap()
            .await
            .unwrap();
        let reply = next_json(&mut rx);
        assert_eq!(reply["type"], "mood_update_success");
        assert_eq!(reply["callbackId"], "c1");
    }

    #[tokio::test]
    async fn test_disconnect_announces_last_connection_only() {
        let engine = engine();
        let (watcher, mut watcher_rx) = engine.connect();
        engine
            .registry
            .authenticate(watcher, "u9".into(), None);
        let (a, _a_rx) = engine.connect();
        let (b, _b_rx) = engine.connect();
        engine.registry.authenticate(a, "u1".into(), None);
        engine.registry.authenticate(b, "u1".into(), None);
        next_json(&mut watcher_rx);

        assert!(engine.disconnect(a));
        assert!(watcher_rx.try_recv().is_err());

        assert!(engine.disconnect(b));
        let status = next_json(&mut watcher_rx);
        assert_eq!(status["type"], "user_status");
        assert_eq!(status["userId"], "u1");
        assert_eq!(status["isOnline"], false);

        assert!(!engine.disconnect(b));
        assert_eq!(engine.metrics.snapshot().connections_active, 1);
    }

    #[test]
    fn test_shutdown_closes_everyone() {
        let engine = engine();
        let (_, mut rx) = engine.connect();
        let signal = engine.shutdown_signal();
        next_json(&mut rx);

        assert_eq!(engine.shutdown(), 1);
        assert!(*signal.borrow());
        assert!(engine.registry.is_empty());
        assert_eq!(
            rx.try_recv().unwrap(),
            Frame::Close {
                code: 1001,
                reason: SHUTDOWN_CLOSE_REASON.to_string()
            }
        );
    }
}
