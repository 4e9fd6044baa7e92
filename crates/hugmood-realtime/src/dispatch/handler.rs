//! Request handler trait and the values it exchanges with the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use hugmood_core::config::RealtimeConfig;
use hugmood_core::types::{ConnectionId, UserId};
use hugmood_services::Backends;

use crate::connection::ConnectionRegistry;
use crate::error::RequestError;
use crate::message::Envelope;

/// Handles one request type.
#[async_trait]
pub trait RequestHandler: Send + Sync + std::fmt::Debug {
    /// The `type` this handler serves.
    fn request_type(&self) -> &'static str;

    /// Whether the connection must be authenticated.
    fn requires_auth(&self) -> bool {
        true
    }

    /// `type` of the failure reply.
    fn error_type(&self) -> &'static str {
        "error"
    }

    /// Text prepended to downstream and timeout failures.
    fn failure_prefix(&self, request: &Envelope) -> String;

    /// Run the request.
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError>;
}

/// What a handler sees of the gateway.
///
/// Holds the requester's id, never its transport handle; deliveries go
/// through the registry so a closed connection is not kept alive.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Requesting connection.
    pub conn_id: ConnectionId,
    /// Identity bound at dispatch time.
    pub user_id: Option<UserId>,
    /// Session token captured at authentication.
    pub session_token: Option<String>,
    /// Downstream services.
    pub backends: Backends,
    /// Connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Gateway settings.
    pub config: Arc<RealtimeConfig>,
}

impl RequestContext {
    /// The requesting user.
    pub fn user_id(&self) -> Result<&UserId, RequestError> {
        self.user_id
            .as_ref()
            .ok_or(RequestError::AuthRequired)
    }

    /// Token forwarded downstream: the request's own `token`, else the
    /// session token captured at authentication.
    pub fn bearer<'a>(&'a self, request: &'a Envelope) -> Option<&'a str> {
        request
            .str_field("token")
            .filter(|t| is_usable_token(t))
            .or(self.session_token.as_deref())
    }
}

/// Clients send `"undefined"` when they have no token.
pub(crate) fn is_usable_token(token: &str) -> bool {
    !token.is_empty() && token != "undefined"
}

/// A follow-up action executed after the reply is queued.
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Deliver to every connection of one user.
    NotifyUser {
        /// Recipient.
        user_id: UserId,
        /// Event to deliver.
        message: Envelope,
    },
    /// Deliver to every authenticated connection of other users.
    BroadcastExcept {
        /// User to skip.
        excluded: UserId,
        /// Event to deliver.
        message: Envelope,
    },
    /// Broadcast a `user_status` change.
    AnnouncePresence {
        /// User whose presence changed.
        user_id: UserId,
        /// New state.
        online: bool,
    },
    /// Look up the mood streak and notify the requester of milestones.
    CheckStreak {
        /// User whose streak is checked.
        user_id: UserId,
        /// Token for the lookup.
        bearer: Option<String>,
    },
}

/// Successful handler output.
#[derive(Debug, Clone)]
pub struct Handled {
    /// Reply to the requester, without callback id.
    pub reply: Envelope,
    /// Follow-up actions.
    pub effects: Vec<SideEffect>,
}

impl Handled {
    /// A reply with no follow-up.
    pub fn reply(reply: Envelope) -> Self {
        Self {
            reply,
            effects: Vec::new(),
        }
    }

    /// Append a follow-up action.
    pub fn with_effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }
}
