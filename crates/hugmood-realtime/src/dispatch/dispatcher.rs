//! Request dispatcher: routing table, auth gate, timeouts, replies, side effects.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hugmood_core::config::RealtimeConfig;
use hugmood_core::error::AppError;
use hugmood_core::types::{ConnectionId, UserId};
use hugmood_services::Backends;

use crate::broadcast::Broadcaster;
use crate::connection::ConnectionRegistry;
use crate::error::RequestError;
use crate::message::{Envelope, builder};
use crate::metrics::GatewayMetrics;

use super::handler::{RequestContext, RequestHandler, SideEffect};
use super::handlers;

/// Routes inbound envelopes to registered handlers.
///
/// Each accepted request runs on its own task, so a slow backend never
/// holds up other requests. Replies follow completion order.
#[derive(Debug)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Arc<dyn RequestHandler>>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    backends: Backends,
    config: Arc<RealtimeConfig>,
    metrics: Arc<GatewayMetrics>,
}

impl Dispatcher {
    /// Create a dispatcher with an empty routing table.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<Broadcaster>,
        backends: Backends,
        config: Arc<RealtimeConfig>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            handlers: HashMap::new(),
            registry,
            broadcaster,
            backends,
            config,
            metrics,
        }
    }

    /// Create a dispatcher serving every built-in request type.
    pub fn with_default_handlers(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<Broadcaster>,
        backends: Backends,
        config: Arc<RealtimeConfig>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let mut dispatcher = Self::new(registry, broadcaster, backends, config, metrics);
        for handler in handlers::defaults() {
            dispatcher.register(handler);
        }
        dispatcher
    }

    /// Register a handler, replacing any previous one for the same type.
    pub fn register(&mut self, handler: Arc<dyn RequestHandler>) {
        let request_type = handler.request_type();
        debug!(request_type, "Registered request handler");
        self.handlers.insert(request_type, handler);
    }

    /// Every routable request type.
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Route `request` from connection `conn_id`.
    ///
    /// Unknown types and unauthenticated access are answered inline. Accepted
    /// requests are spawned; the returned handle completes once the reply and
    /// side effects have been issued.
    pub fn dispatch(self: &Arc<Self>, conn_id: ConnectionId, request: Envelope) -> Option<JoinHandle<()>> {
        let Some(connection) = self.registry.find(conn_id) else {
            debug!(conn_id = %conn_id, request_type = %request.kind, "Request from unknown connection");
            return None;
        };

        let Some(handler) = self.handlers.get(request.kind.as_str()).cloned() else {
            warn!(conn_id = %conn_id, request_type = %request.kind, "Unrecognized message type");
            self.reject(conn_id, &request, RequestError::UnknownRequestType(request.kind.clone()));
            return None;
        };

        if handler.requires_auth() && !connection.authenticated {
            debug!(conn_id = %conn_id, request_type = %request.kind, "Rejected unauthenticated request");
            self.reject(conn_id, &request, RequestError::AuthRequired);
            return None;
        }

        let ctx = RequestContext {
            conn_id,
            user_id: connection.user_id,
            session_token: connection.session_token,
            backends: self.backends.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        };
        let dispatcher = Arc::clone(self);
        Some(tokio::spawn(async move {
            dispatcher.run(handler, ctx, request).await;
        }))
    }

    fn reject(&self, conn_id: ConnectionId, request: &Envelope, err: RequestError) {
        self.metrics.record_request_failed();
        let reply = builder::error(err.to_string()).in_reply_to(request);
        self.broadcaster.send_to_connection(conn_id, &reply);
    }

    async fn run(&self, handler: Arc<dyn RequestHandler>, ctx: RequestContext, request: Envelope) {
        let conn_id = ctx.conn_id;
        let timeout = self.config.request_timeout();

        let outcome = match tokio::time::timeout(timeout, handler.handle(&ctx, &request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RequestError::Timeout(timeout)),
        };

        match outcome {
            Ok(handled) => {
                let reply = handled.reply.in_reply_to(&request);
                if !self.broadcaster.send_to_connection(conn_id, &reply) {
                    debug!(conn_id = %conn_id, request_type = %request.kind, "Reply not delivered");
                }
                for effect in handled.effects {
                    self.apply(&ctx, effect).await;
                }
            }
            Err(err) => {
                let message = if err.takes_prefix() {
                    format!("{}: {err}", handler.failure_prefix(&request))
                } else {
                    err.to_string()
                };
                warn!(
                    conn_id = %conn_id,
                    request_type = %request.kind,
                    callback_id = ?request.callback_id,
                    error = %message,
                    "Request failed"
                );
                self.metrics.record_request_failed();
                let reply = builder::failure(handler.error_type(), message).in_reply_to(&request);
                self.broadcaster.send_to_connection(conn_id, &reply);
            }
        }
    }

    async fn apply(&self, ctx: &RequestContext, effect: SideEffect) {
        match effect {
            SideEffect::NotifyUser { user_id, message } => {
                if !self.broadcaster.send_to_user(&user_id, &message) {
                    debug!(user_id = %user_id, message_type = %message.kind, "Recipient offline, event dropped");
                }
            }
            SideEffect::BroadcastExcept { excluded, message } => {
                self.broadcaster.broadcast_except(&excluded, &message);
            }
            SideEffect::AnnouncePresence { user_id, online } => {
                self.broadcaster.announce_presence(&user_id, online);
            }
            SideEffect::CheckStreak { user_id, bearer } => {
                if let Err(e) = self
                    .check_streak(ctx.conn_id, &user_id, bearer.as_deref())
                    .await
                {
                    warn!(user_id = %user_id, error = %e, "Streak check failed");
                }
            }
        }
    }

    async fn check_streak(
        &self,
        conn_id: ConnectionId,
        user_id: &UserId,
        bearer: Option<&str>,
    ) -> Result<(), AppError> {
        let streak = tokio::time::timeout(
            self.config.request_timeout(),
            self.backends.mood.mood_streak(user_id, bearer),
        )
        .await
        .map_err(|_| AppError::timeout("Mood streak lookup timed out"))??;

        if let Some(milestone) = milestone_for(streak.current_streak, &self.config.streak_milestones)
        {
            info!(user_id = %user_id, milestone, "Mood streak milestone reached");
            let event = builder::streak_milestone(milestone, streak.current_streak, Utc::now());
            self.broadcaster.send_to_connection(conn_id, &event);
        }
        Ok(())
    }
}

/// The milestone reached by `current`, if any: a configured length or a
/// positive multiple of 100.
pub fn milestone_for(current: u32, milestones: &[u32]) -> Option<u32> {
    let reached = current > 0 && (milestones.contains(&current) || current % 100 == 0);
    reached.then_some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::Harness;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_milestones() {
        let configured = [3, 7, 14, 30, 60, 100];
        assert_eq!(milestone_for(7, &configured), Some(7));
        assert_eq!(milestone_for(300, &configured), Some(300));
        assert_eq!(milestone_for(8, &configured), None);
        assert_eq!(milestone_for(0, &configured), None);
    }

    #[test]
    fn test_default_routing_table() {
        let harness = Harness::new();
        assert_eq!(
            harness.dispatcher.registered_types(),
            vec![
                "authenticate",
                "create_group_hug",
                "fetch_data",
                "follow_user",
                "ping",
                "request_hug",
                "send_hug",
                "social_share",
                "update_mood",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_type_echoes_callback() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(Some("u1"));

        harness
            .request(id, json!({"type": "launch_rocket", "callbackId": "c9"}))
            .await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["type"], "error");
        assert_eq!(replies[0]["message"], "Unrecognized message type");
        assert_eq!(replies[0]["callbackId"], "c9");
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_make_no_downstream_calls() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(None);

        for (i, kind) in [
            "fetch_data",
            "update_mood",
            "send_hug",
            "request_hug",
            "create_group_hug",
            "follow_user",
            "social_share",
        ]
        .into_iter()
        .enumerate()
        {
            harness
                .request(id, json!({"type": kind, "callbackId": i, "recipientId": "u2"}))
                .await;
            let replies = Harness::drain(&mut rx);
            assert_eq!(replies.len(), 1, "{kind}");
            assert_eq!(replies[0]["type"], "error");
            assert_eq!(replies[0]["message"], "Authentication required");
            assert_eq!(replies[0]["callbackId"], i);
        }

        assert!(harness.mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ping_needs_no_auth() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(None);

        harness.request(id, json!({"type": "ping", "callbackId": "p"})).await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "pong");
        assert_eq!(replies[0]["callbackId"], "p");
        assert!(replies[0]["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_downstream_failure_is_prefixed_and_keeps_connection() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(Some("u1"));
        harness.mock.fail("send_hug", "recipient not found");

        harness
            .request(
                id,
                json!({"type": "send_hug", "recipientId": "u2", "callbackId": "c2"}),
            )
            .await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "error");
        assert_eq!(replies[0]["message"], "Failed to send hug: recipient not found");
        assert_eq!(replies[0]["callbackId"], "c2");
        assert!(harness.registry.contains(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let harness = Harness::with_timeout(2);
        let (id, mut rx) = harness.connect(Some("u1"));
        harness.mock.delay("create_mood", Duration::from_secs(60));

        harness
            .request(id, json!({"type": "update_mood", "mood": "good", "callbackId": "slow"}))
            .await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0]["message"],
            "Failed to update mood: request timed out after 2s"
        );
        assert_eq!(replies[0]["callbackId"], "slow");
    }

    #[tokio::test]
    async fn test_reply_to_closed_connection_is_dropped() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(Some("u1"));
        harness.mock.delay("send_hug", Duration::from_millis(50));

        let task = harness
            .dispatcher
            .dispatch(
                id,
                serde_json::from_value(json!({"type": "send_hug", "recipientId": "u2"})).unwrap(),
            )
            .unwrap();
        harness.registry.remove(id);
        task.await.unwrap();

        assert!(Harness::drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_request_does_not_keep_transport_open() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(Some("u1"));
        harness.mock.delay("send_hug", Duration::from_secs(60));

        let task = harness
            .dispatcher
            .dispatch(
                id,
                serde_json::from_value(json!({"type": "send_hug", "recipientId": "u2"})).unwrap(),
            )
            .unwrap();
        drop(harness.registry.remove(id));

        assert!(rx.recv().await.is_none());
        assert!(!task.is_finished());
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_replies_follow_completion_order() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(Some("u1"));
        harness.mock.delay("mood_history", Duration::from_millis(80));

        let slow = harness
            .dispatcher
            .dispatch(
                id,
                serde_json::from_value(
                    json!({"type": "fetch_data", "dataType": "mood_history", "callbackId": "slow"}),
                )
                .unwrap(),
            )
            .unwrap();
        let fast = harness
            .dispatcher
            .dispatch(
                id,
                serde_json::from_value(json!({"type": "ping", "callbackId": "fast"})).unwrap(),
            )
            .unwrap();
        fast.await.unwrap();
        slow.await.unwrap();

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["callbackId"], "fast");
        assert_eq!(replies[1]["callbackId"], "slow");
    }
}
