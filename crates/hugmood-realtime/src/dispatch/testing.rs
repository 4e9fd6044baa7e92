//! Test harness wiring a dispatcher to the in-memory backend.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use hugmood_core::config::RealtimeConfig;
use hugmood_core::types::{ConnectionId, UserId};
use hugmood_services::mock::MockBackend;

use crate::broadcast::Broadcaster;
use crate::connection::{ConnectionHandle, ConnectionRegistry, Frame};
use crate::metrics::GatewayMetrics;

use super::Dispatcher;

pub(crate) struct Harness {
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub mock: MockBackend,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(MockBackend::new(), RealtimeConfig::default())
    }

    pub fn with_mock(mock: MockBackend) -> Self {
        Self::build(mock, RealtimeConfig::default())
    }

    pub fn with_timeout(seconds: u64) -> Self {
        let config = RealtimeConfig {
            request_timeout_seconds: seconds,
            ..RealtimeConfig::default()
        };
        Self::build(MockBackend::new(), config)
    }

    fn build(mock: MockBackend, config: RealtimeConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = Arc::new(GatewayMetrics::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone(), metrics.clone()));
        let dispatcher = Arc::new(Dispatcher::with_default_handlers(
            registry.clone(),
            broadcaster,
            mock.backends(),
            Arc::new(config),
            metrics,
        ));
        Self {
            registry,
            dispatcher,
            mock,
        }
    }

    /// Register a connection, optionally bound to `user` with token `token-<user>`.
    pub fn connect(&self, user: Option<&str>) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let (handle, rx) = ConnectionHandle::channel(32);
        let id = self.registry.register(handle);
        if let Some(user) = user {
            self.registry
                .authenticate(id, UserId::from(user), Some(format!("token-{user}")));
        }
        (id, rx)
    }

    /// Dispatch `raw` and wait for the reply and side effects.
    pub async fn request(&self, id: ConnectionId, raw: Value) {
        let envelope = serde_json::from_value(raw).unwrap();
        if let Some(task) = self.dispatcher.dispatch(id, envelope) {
            task.await.unwrap();
        }
    }

    /// Every queued text frame, parsed.
    pub fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let Frame::Text(text) = frame {
                out.push(serde_json::from_str(&text).unwrap());
            }
        }
        out
    }
}
