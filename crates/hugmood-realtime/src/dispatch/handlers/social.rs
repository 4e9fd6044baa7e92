//! Follow graph changes and sharing to external platforms.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use hugmood_core::types::UserId;
use hugmood_services::ShareRequest;

use crate::dispatch::handler::{Handled, RequestContext, RequestHandler, SideEffect};
use crate::dispatch::payload;
use crate::error::RequestError;
use crate::message::{Envelope, builder};

fn default_action() -> String {
    "follow".to_string()
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct FollowPayload {
    #[serde(default, alias = "userId")]
    #[validate(length(min = 1, message = "targetUserId is required"))]
    target_user_id: String,
    #[serde(default = "default_action")]
    action: String,
}

/// Follows or unfollows a user and tells them about it.
#[derive(Debug, Default)]
pub struct FollowUserHandler;

#[async_trait]
impl RequestHandler for FollowUserHandler {
    fn request_type(&self) -> &'static str {
        "follow_user"
    }

    fn failure_prefix(&self, request: &Envelope) -> String {
        format!(
            "Failed to {} user",
            request.str_field("action").unwrap_or("follow")
        )
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let payload: FollowPayload = payload::parse(request)?;
        let follower = ctx.user_id()?.clone();
        let target = UserId::from(payload.target_user_id);
        let bearer = ctx.bearer(request);

        let (result, is_following) = match payload.action.as_str() {
            "follow" => (ctx.backends.social.follow_user(&target, bearer).await?, true),
            "unfollow" => (ctx.backends.social.unfollow_user(&target, bearer).await?, false),
            other => {
                return Err(RequestError::InvalidPayload(format!(
                    "Unknown follow action: {other}"
                )));
            }
        };

        let reply = Envelope::new(format!("{}_user_success", payload.action))
            .with("targetUserId", target.as_str())
            .with("isFollowing", is_following)
            .with("result", result);
        Ok(Handled::reply(reply).with_effect(SideEffect::NotifyUser {
            message: builder::follower_update(&follower, &payload.action, is_following),
            user_id: target,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SharedContent {
    id: Option<Value>,
    text: Option<String>,
}

impl SharedContent {
    /// Content ids arrive as strings or numbers.
    fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SocialSharePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "platform is required"))]
    platform: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "contentType is required"))]
    content_type: String,
    #[serde(default)]
    content: SharedContent,
}

/// Shares a mood or hug to an external platform.
#[derive(Debug, Default)]
pub struct SocialShareHandler;

#[async_trait]
impl RequestHandler for SocialShareHandler {
    fn request_type(&self) -> &'static str {
        "social_share"
    }

    fn failure_prefix(&self, _request: &Envelope) -> String {
        "Failed to share content".to_string()
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let payload: SocialSharePayload = payload::parse(request)?;
        let share = ShareRequest {
            content_id: payload.content.id(),
            text: payload.content.text,
            platform: payload.platform,
            content_type: payload.content_type,
        };
        let result = ctx
            .backends
            .share_to_social(&share, ctx.bearer(request))
            .await?;

        Ok(Handled::reply(
            Envelope::new("social_share_success")
                .with("platform", share.platform)
                .with("contentType", share.content_type)
                .with("result", result),
        ))
    }
}
