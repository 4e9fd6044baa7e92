//! Service traits for the domain backends.
//!
//! Every call is a black-box RPC returning a success payload or an
//! [`AppError`](hugmood_core::error::AppError). `bearer` is the caller's
//! access token, forwarded as-is.

use async_trait::async_trait;
use serde_json::Value;

use hugmood_core::result::AppResult;
use hugmood_core::types::UserId;

use crate::types::{
    AuthSession, DataQuery, MoodStreak, NewGroupHug, NewHug, NewHugRequest, NewMood, QueryParams,
    RegistrationFields, ShareRequest,
};

/// Identity and session operations.
#[async_trait]
pub trait AuthService: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve the user owning `token`.
    async fn who_am_i(&self, token: &str) -> AppResult<Value>;

    /// Log in with an email-or-username and password.
    async fn login(&self, identifier: &str, password: &str) -> AppResult<AuthSession>;

    /// Create an account and log it in.
    async fn register(&self, fields: &RegistrationFields) -> AppResult<AuthSession>;

    /// Create an anonymous session.
    async fn anonymous_login(
        &self,
        nickname: Option<&str>,
        avatar_id: Option<i64>,
    ) -> AppResult<AuthSession>;
}

/// Mood tracking operations.
#[async_trait]
pub trait MoodService: Send + Sync + std::fmt::Debug + 'static {
    /// Record a mood entry for the bearer's user.
    async fn create_mood(&self, mood: &NewMood, bearer: Option<&str>) -> AppResult<Value>;

    /// Current and longest streak of `user_id`.
    async fn mood_streak(&self, user_id: &UserId, bearer: Option<&str>) -> AppResult<MoodStreak>;

    /// Run a mood-owned read query.
    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value>;

    /// Share mood content to a social platform.
    async fn share_to_social(&self, share: &ShareRequest, bearer: Option<&str>)
    -> AppResult<Value>;
}

/// Social graph operations.
#[async_trait]
pub trait SocialService: Send + Sync + std::fmt::Debug + 'static {
    /// Follow `target`.
    async fn follow_user(&self, target: &UserId, bearer: Option<&str>) -> AppResult<Value>;

    /// Stop following `target`.
    async fn unfollow_user(&self, target: &UserId, bearer: Option<&str>) -> AppResult<Value>;

    /// Run a social-owned read query.
    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value>;
}

/// Hug exchange operations.
#[async_trait]
pub trait HugService: Send + Sync + std::fmt::Debug + 'static {
    /// Send a hug.
    async fn send_hug(&self, hug: &NewHug, bearer: Option<&str>) -> AppResult<Value>;

    /// Ask for a hug.
    async fn request_hug(&self, request: &NewHugRequest, bearer: Option<&str>)
    -> AppResult<Value>;

    /// Start a group hug.
    async fn create_group_hug(&self, group: &NewGroupHug, bearer: Option<&str>)
    -> AppResult<Value>;

    /// Run a hug-owned read query.
    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value>;

    /// Share hug content to a social platform.
    async fn share_to_social(&self, share: &ShareRequest, bearer: Option<&str>)
    -> AppResult<Value>;
}
