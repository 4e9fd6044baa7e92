//! In-memory backend for development and testing.
//!
//! One [`MockBackend`] implements all four service traits. Every call is
//! recorded; failures and delays can be scripted per operation name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use hugmood_core::error::AppError;
use hugmood_core::result::AppResult;
use hugmood_core::types::UserId;

use crate::backends::Backends;
use crate::traits::{AuthService, HugService, MoodService, SocialService};
use crate::types::{
    AuthSession, DataQuery, MoodStreak, NewGroupHug, NewHug, NewHugRequest, NewMood, QueryParams,
    RegistrationFields, ServiceKind, ShareRequest, user_id_of,
};

/// A call observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Service the call was routed to.
    pub service: ServiceKind,
    /// Operation name, e.g. `send_hug` or a query name.
    pub operation: String,
    /// Bearer token forwarded with the call.
    pub bearer: Option<String>,
    /// Call arguments.
    pub args: Value,
}

#[derive(Debug)]
struct Account {
    password: String,
    user: Value,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    tokens: HashMap<String, Value>,
    accounts: HashMap<String, Account>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    streak: Option<MoodStreak>,
    next_user: u64,
    next_record: u64,
}

impl MockState {
    fn mint_user(&mut self) -> String {
        self.next_user += 1;
        format!("u{}", self.next_user)
    }

    fn mint_record(&mut self, prefix: &str) -> String {
        self.next_record += 1;
        format!("{prefix}{}", self.next_record)
    }

    fn issue_session(&mut self, user: Value) -> AuthSession {
        let id = user_id_of(&user).map(|u| u.to_string()).unwrap_or_default();
        let token = format!("token-{id}");
        self.tokens.insert(token.clone(), user.clone());
        AuthSession {
            token,
            refresh_token: Some(format!("refresh-{id}")),
            user,
        }
    }

    fn caller_id(&self, bearer: Option<&str>) -> Value {
        bearer
            .and_then(|t| self.tokens.get(t))
            .and_then(|u| u.get("id").cloned())
            .unwrap_or(Value::Null)
    }
}

/// Scriptable in-memory implementation of every backend.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Accept `token` as identifying `user`.
    pub fn with_token(self, token: &str, user: Value) -> Self {
        self.lock().tokens.insert(token.to_string(), user);
        self
    }

    /// Accept `identifier`/`password` credentials for `user`.
    pub fn with_account(self, identifier: &str, password: &str, user: Value) -> Self {
        self.lock().accounts.insert(
            identifier.to_string(),
            Account {
                password: password.to_string(),
                user,
            },
        );
        self
    }

    /// Fix the streak reported by `mood_streak`.
    pub fn with_streak(self, current: u32, longest: u32) -> Self {
        self.lock().streak = Some(MoodStreak {
            current_streak: current,
            longest_streak: longest,
        });
        self
    }

    /// Make `operation` fail with `message`.
    pub fn fail(&self, operation: &str, message: &str) {
        self.lock()
            .failures
            .insert(operation.to_string(), message.to_string());
    }

    /// Delay `operation` by `delay` before it completes.
    pub fn delay(&self, operation: &str, delay: Duration) {
        self.lock().delays.insert(operation.to_string(), delay);
    }

    /// All calls observed so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls to one operation.
    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// A [`Backends`] bundle where every service is this mock.
    pub fn backends(&self) -> Backends {
        let shared = Arc::new(self.clone());
        Backends::new(shared.clone(), shared.clone(), shared.clone(), shared)
    }

    async fn invoke(
        &self,
        service: ServiceKind,
        operation: &str,
        bearer: Option<&str>,
        args: Value,
    ) -> AppResult<()> {
        let (delay, failure) = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                service,
                operation: operation.to_string(),
                bearer: bearer.map(str::to_string),
                args,
            });
            (
                state.delays.get(operation).copied(),
                state.failures.get(operation).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(AppError::external_service(message)),
            None => Ok(()),
        }
    }

    fn share(&self, share: &ShareRequest) -> Value {
        json!({
            "success": true,
            "message": format!("Shared to {}", share.platform),
            "url": format!("https://{}.example/share/{}", share.platform, share.content_id.as_deref().unwrap_or("")),
        })
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn who_am_i(&self, token: &str) -> AppResult<Value> {
        self.invoke(ServiceKind::Auth, "who_am_i", Some(token), json!({}))
            .await?;
        self.lock()
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::authentication("Invalid token"))
    }

    async fn login(&self, identifier: &str, password: &str) -> AppResult<AuthSession> {
        self.invoke(
            ServiceKind::Auth,
            "login",
            None,
            json!({ "emailOrUsername": identifier }),
        )
        .await?;
        let mut state = self.lock();
        let user = match state.accounts.get(identifier) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AppError::authentication("Invalid credentials")),
        };
        Ok(state.issue_session(user))
    }

    async fn register(&self, fields: &RegistrationFields) -> AppResult<AuthSession> {
        self.invoke(
            ServiceKind::Auth,
            "register",
            None,
            json!({ "email": fields.email, "username": fields.username }),
        )
        .await?;
        let mut state = self.lock();
        if state.accounts.contains_key(&fields.username) {
            return Err(AppError::validation("Username already taken"));
        }
        let id = state.mint_user();
        let user = json!({
            "id": id,
            "username": fields.username,
            "email": fields.email,
            "name": fields.display_name(),
            "isAnonymous": false,
            "isVerified": false,
        });
        state.accounts.insert(
            fields.username.clone(),
            Account {
                password: fields.password.clone(),
                user: user.clone(),
            },
        );
        Ok(state.issue_session(user))
    }

    async fn anonymous_login(
        &self,
        nickname: Option<&str>,
        avatar_id: Option<i64>,
    ) -> AppResult<AuthSession> {
        self.invoke(
            ServiceKind::Auth,
            "anonymous_login",
            None,
            json!({ "nickname": nickname, "avatarId": avatar_id }),
        )
        .await?;
        let mut state = self.lock();
        let id = state.mint_user();
        let name = nickname.map(str::to_string).unwrap_or_else(|| format!("anon-{id}"));
        let user = json!({
            "id": id,
            "username": name,
            "name": name,
            "isAnonymous": true,
            "isVerified": false,
        });
        Ok(state.issue_session(user))
    }
}

#[async_trait]
impl MoodService for MockBackend {
    async fn create_mood(&self, mood: &NewMood, bearer: Option<&str>) -> AppResult<Value> {
        self.invoke(ServiceKind::Mood, "create_mood", bearer, json!(mood))
            .await?;
        let mut state = self.lock();
        let owner = state.caller_id(bearer);
        Ok(json!({
            "id": state.mint_record("m"),
            "userId": owner,
            "value": mood.value,
            "score": mood.score,
            "note": mood.note,
            "isPublic": mood.is_public,
            "createdAt": Utc::now().to_rfc3339(),
        }))
    }

    async fn mood_streak(&self, user_id: &UserId, bearer: Option<&str>) -> AppResult<MoodStreak> {
        self.invoke(
            ServiceKind::Mood,
            "mood_streak",
            bearer,
            json!({ "userId": user_id }),
        )
        .await?;
        Ok(self.lock().streak.unwrap_or(MoodStreak {
            current_streak: 1,
            longest_streak: 1,
        }))
    }

    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(
            ServiceKind::Mood,
            query.as_str(),
            bearer,
            Value::Object(params.fields.clone()),
        )
        .await?;
        Ok(json!({ "query": query, "userId": params.requester, "items": [] }))
    }

    async fn share_to_social(
        &self,
        share: &ShareRequest,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(ServiceKind::Mood, "share_to_social", bearer, json!(share))
            .await?;
        Ok(self.share(share))
    }
}

#[async_trait]
impl SocialService for MockBackend {
    async fn follow_user(&self, target: &UserId, bearer: Option<&str>) -> AppResult<Value> {
        self.invoke(
            ServiceKind::Social,
            "follow_user",
            bearer,
            json!({ "userId": target }),
        )
        .await?;
        Ok(json!({ "success": true, "user": { "userId": target, "isFollowing": true } }))
    }

    async fn unfollow_user(&self, target: &UserId, bearer: Option<&str>) -> AppResult<Value> {
        self.invoke(
            ServiceKind::Social,
            "unfollow_user",
            bearer,
            json!({ "userId": target }),
        )
        .await?;
        Ok(json!({ "success": true, "user": { "userId": target, "isFollowing": false } }))
    }

    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(
            ServiceKind::Social,
            query.as_str(),
            bearer,
            Value::Object(params.fields.clone()),
        )
        .await?;
        Ok(json!({ "query": query, "userId": params.subject(), "users": [], "totalCount": 0, "hasMore": false }))
    }
}

#[async_trait]
impl HugService for MockBackend {
    async fn send_hug(&self, hug: &NewHug, bearer: Option<&str>) -> AppResult<Value> {
        self.invoke(ServiceKind::Hug, "send_hug", bearer, json!(hug))
            .await?;
        let mut state = self.lock();
        let sender = state.caller_id(bearer);
        Ok(json!({
            "id": state.mint_record("h"),
            "sender": { "id": sender },
            "recipient": { "id": hug.recipient_id },
            "hugType": hug.hug_type,
            "message": hug.message,
            "mediaUrl": hug.media_url,
            "createdAt": Utc::now().to_rfc3339(),
        }))
    }

    async fn request_hug(
        &self,
        request: &NewHugRequest,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(ServiceKind::Hug, "request_hug", bearer, json!(request))
            .await?;
        let mut state = self.lock();
        let requester = state.caller_id(bearer);
        Ok(json!({
            "id": state.mint_record("r"),
            "requester": { "id": requester },
            "recipient": request.recipient_id.as_ref().map(|id| json!({ "id": id })),
            "message": request.message,
            "isPublic": request.is_public,
            "status": "pending",
            "createdAt": Utc::now().to_rfc3339(),
        }))
    }

    async fn create_group_hug(
        &self,
        group: &NewGroupHug,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(ServiceKind::Hug, "create_group_hug", bearer, json!(group))
            .await?;
        let mut state = self.lock();
        let creator = state.caller_id(bearer);
        Ok(json!({
            "id": state.mint_record("g"),
            "creator": { "id": creator },
            "title": group.title,
            "message": group.message,
            "hugType": group.hug_type,
            "maxParticipants": group.max_participants,
            "isPublic": group.is_public,
            "participantCount": 1,
            "hasJoined": true,
            "createdAt": Utc::now().to_rfc3339(),
        }))
    }

    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(
            ServiceKind::Hug,
            query.as_str(),
            bearer,
            Value::Object(params.fields.clone()),
        )
        .await?;
        Ok(json!({ "query": query, "userId": params.requester, "totalCount": 0, "hasMore": false }))
    }

    async fn share_to_social(
        &self,
        share: &ShareRequest,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.invoke(ServiceKind::Hug, "share_to_social", bearer, json!(share))
            .await?;
        Ok(self.share(share))
    }
}
