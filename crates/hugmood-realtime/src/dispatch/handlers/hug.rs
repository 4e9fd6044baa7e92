//! Hug exchange: direct hugs, hug requests, group hugs.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;
use validator::Validate;

use hugmood_core::types::UserId;
use hugmood_services::{NewGroupHug, NewHug, NewHugRequest};

use crate::dispatch::handler::{Handled, RequestContext, RequestHandler, SideEffect};
use crate::dispatch::payload;
use crate::error::RequestError;
use crate::message::{Envelope, builder};

fn default_hug_type() -> String {
    "standard".to_string()
}

fn default_group_hug_type() -> String {
    "group".to_string()
}

fn default_duration() -> u32 {
    24
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SendHugPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "recipientId is required"))]
    recipient_id: String,
    #[serde(default = "default_hug_type")]
    hug_type: String,
    message: Option<String>,
    media_url: Option<String>,
}

/// Sends a hug and notifies the recipient on every device.
#[derive(Debug, Default)]
pub struct SendHugHandler;

#[async_trait]
impl RequestHandler for SendHugHandler {
    fn request_type(&self) -> &'static str {
        "send_hug"
    }

    fn failure_prefix(&self, _request: &Envelope) -> String {
        "Failed to send hug".to_string()
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let payload: SendHugPayload = payload::parse(request)?;
        let hug = NewHug {
            recipient_id: UserId::from(payload.recipient_id),
            hug_type: payload.hug_type,
            message: payload.message,
            media_url: payload.media_url,
        };
        let sent = ctx.backends.hug.send_hug(&hug, ctx.bearer(request)).await?;

        Ok(
            Handled::reply(Envelope::new("send_hug_success").with("hug", sent.clone()))
                .with_effect(SideEffect::NotifyUser {
                    user_id: hug.recipient_id,
                    message: builder::hug_received(sent),
                }),
        )
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RequestHugPayload {
    recipient_id: Option<String>,
    message: Option<String>,
    #[serde(default)]
    is_public: bool,
}

/// Asks one user, the community, or both for a hug.
#[derive(Debug, Default)]
pub struct RequestHugHandler;

#[async_trait]
impl RequestHandler for RequestHugHandler {
    fn request_type(&self) -> &'static str {
        "request_hug"
    }

    fn failure_prefix(&self, _request: &Envelope) -> String {
        "Failed to request hug".to_string()
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let payload: RequestHugPayload = payload::parse(request)?;
        let recipient_id = payload
            .recipient_id
            .filter(|r| !r.is_empty())
            .map(UserId::from);
        if recipient_id.is_none() && !payload.is_public {
            return Err(RequestError::InvalidPayload(
                "recipientId is required for a private hug request".to_string(),
            ));
        }

        let hug_request = NewHugRequest {
            recipient_id,
            message: payload.message,
            is_public: payload.is_public,
        };
        let created = ctx
            .backends
            .hug
            .request_hug(&hug_request, ctx.bearer(request))
            .await?;

        let mut handled =
            Handled::reply(Envelope::new("request_hug_success").with("request", created.clone()));
        if let Some(recipient) = hug_request.recipient_id {
            handled = handled.with_effect(SideEffect::NotifyUser {
                user_id: recipient,
                message: builder::hug_request_received(created.clone()),
            });
        }
        if hug_request.is_public {
            handled = handled.with_effect(SideEffect::BroadcastExcept {
                excluded: ctx.user_id()?.clone(),
                message: builder::community_hug_request(created),
            });
        }
        Ok(handled)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateGroupHugPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "title is required"))]
    title: String,
    message: Option<String>,
    #[serde(default = "default_group_hug_type")]
    hug_type: String,
    #[serde(default)]
    max_participants: u32,
    #[serde(default)]
    is_public: bool,
    #[serde(default = "default_duration")]
    #[validate(range(min = 1, max = 720, message = "duration must be between 1 and 720 hours"))]
    duration: u32,
    #[serde(default)]
    invited_users: Vec<String>,
}

/// Creates a group hug and invites the listed users.
#[derive(Debug, Default)]
pub struct CreateGroupHugHandler;

#[async_trait]
impl RequestHandler for CreateGroupHugHandler {
    fn request_type(&self) -> &'static str {
        "create_group_hug"
    }

    fn failure_prefix(&self, _request: &Envelope) -> String {
        "Failed to create group hug".to_string()
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let payload: CreateGroupHugPayload = payload::parse(request)?;
        let creator = ctx.user_id()?.clone();

        // Deduplicated, creator excluded, stable order.
        let invited: BTreeSet<UserId> = payload
            .invited_users
            .into_iter()
            .filter(|u| !u.is_empty())
            .map(UserId::from)
            .filter(|u| *u != creator)
            .collect();

        let group = NewGroupHug {
            title: payload.title,
            message: payload.message,
            hug_type: payload.hug_type,
            max_participants: payload.max_participants,
            is_public: payload.is_public,
            duration: payload.duration,
            invited_users: invited.iter().cloned().collect(),
        };
        let created = ctx
            .backends
            .hug
            .create_group_hug(&group, ctx.bearer(request))
            .await?;

        let handled = Handled::reply(
            Envelope::new("create_group_hug_success").with("groupHug", created.clone()),
        );
        Ok(invited.into_iter().fold(handled, |handled, user_id| {
            handled.with_effect(SideEffect::NotifyUser {
                user_id,
                message: builder::group_hug_invite(created.clone()),
            })
        }))
    }
}
