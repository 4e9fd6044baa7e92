//! `update_mood`: record a mood entry, share it, check the streak.

use async_trait::async_trait;
use serde::Deserialize;
use validator::Validate;

use hugmood_services::NewMood;

use crate::dispatch::handler::{Handled, RequestContext, RequestHandler, SideEffect};
use crate::dispatch::payload;
use crate::error::RequestError;
use crate::message::{Envelope, builder};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateMoodPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "mood is required"))]
    mood: String,
    note: Option<String>,
    #[serde(default)]
    is_public: bool,
    #[serde(alias = "value")]
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    score: Option<i64>,
}

/// Records a mood entry for the requester.
///
/// Public entries are broadcast to every other authenticated user. The
/// requester's streak is checked afterwards and a `streak_milestone` event
/// follows when one is reached.
#[derive(Debug, Default)]
pub struct UpdateMoodHandler;

#[async_trait]
impl RequestHandler for UpdateMoodHandler {
    fn request_type(&self) -> &'static str {
        "update_mood"
    }

    fn failure_prefix(&self, _request: &Envelope) -> String {
        "Failed to update mood".to_string()
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let payload: UpdateMoodPayload = payload::parse(request)?;
        let user_id = ctx.user_id()?.clone();
        let bearer = ctx.bearer(request);

        let mood = NewMood {
            value: payload.mood,
            note: payload.note,
            is_public: payload.is_public,
            score: payload.score,
        };
        let created = ctx.backends.mood.create_mood(&mood, bearer).await?;

        let mut handled =
            Handled::reply(Envelope::new("mood_update_success").with("mood", created.clone()));
        if mood.is_public {
            handled = handled.with_effect(SideEffect::BroadcastExcept {
                excluded: user_id.clone(),
                message: builder::mood_update(&user_id, created),
            });
        }
        Ok(handled.with_effect(SideEffect::CheckStreak {
            user_id,
            bearer: bearer.map(str::to_string),
        }))
    }
}
