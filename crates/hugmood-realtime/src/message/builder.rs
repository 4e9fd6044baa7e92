//! Constructors for server-originated envelopes.

use chrono::{DateTime, Utc};
use serde_json::Value;

use hugmood_core::types::UserId;
use hugmood_services::AuthSession;

use super::envelope::Envelope;

/// Greeting sent on accept.
pub fn connection_established() -> Envelope {
    Envelope::new("connection_established").with("message", "Connected to HugMood API")
}

/// Reply to `ping`.
pub fn pong(now: DateTime<Utc>) -> Envelope {
    Envelope::new("pong").with("timestamp", now.timestamp_millis())
}

/// Generic error reply.
pub fn error(message: impl Into<String>) -> Envelope {
    failure("error", message)
}

/// Error reply of an explicit type, e.g. `auth_error`.
pub fn failure(kind: &str, message: impl Into<String>) -> Envelope {
    Envelope::new(kind).with("message", message.into())
}

/// Successful handshake reply.
pub fn session_established(kind: &str, user_id: &UserId, session: &AuthSession) -> Envelope {
    let mut env = Envelope::new(kind)
        .with("userId", user_id.as_str())
        .with("user", session.user.clone())
        .with("token", session.token.clone());
    if let Some(refresh) = &session.refresh_token {
        env = env.with("refreshToken", refresh.clone());
    }
    env
}

/// Presence change of a user.
pub fn user_status(user_id: &UserId, online: bool) -> Envelope {
    Envelope::new("user_status")
        .with("userId", user_id.as_str())
        .with("isOnline", online)
}

/// A public mood entry by `user_id`.
pub fn mood_update(user_id: &UserId, mood: Value) -> Envelope {
    Envelope::new("mood_update")
        .with("userId", user_id.as_str())
        .with("mood", mood)
}

/// A streak milestone reached by the requester.
pub fn streak_milestone(milestone: u32, current_streak: u32, at: DateTime<Utc>) -> Envelope {
    Envelope::new("streak_milestone")
        .with("milestone", milestone)
        .with("currentStreak", current_streak)
        .with("achievedAt", at.to_rfc3339())
}

/// A hug delivered to its recipient.
pub fn hug_received(hug: Value) -> Envelope {
    Envelope::new("hug_received").with("hug", hug)
}

/// A directed hug request delivered to its recipient.
pub fn hug_request_received(request: Value) -> Envelope {
    Envelope::new("hug_request_received").with("request", request)
}

/// A public hug request shown to the community.
pub fn community_hug_request(request: Value) -> Envelope {
    Envelope::new("community_hug_request").with("request", request)
}

/// A group hug invitation.
pub fn group_hug_invite(group_hug: Value) -> Envelope {
    Envelope::new("group_hug_invite").with("groupHug", group_hug)
}

/// Someone followed or unfollowed the recipient.
pub fn follower_update(follower: &UserId, action: &str, is_following: bool) -> Envelope {
    Envelope::new("follower_update")
        .with("userId", follower.as_str())
        .with("action", action)
        .with("isFollowing", is_following)
}

/// Fetched data.
pub fn fetch_success(data_type: &str, data: Value) -> Envelope {
    Envelope::new("fetch_success")
        .with("dataType", data_type)
        .with("data", data)
}
