//! Multi-method authentication handshake.
//!
//! A connection moves from unauthenticated to authenticating while the auth
//! backend is consulted, then to authenticated on success. Failures leave it
//! open for another attempt.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use hugmood_core::types::ConnectionId;
use hugmood_services::{AuthSession, RegistrationFields};

use crate::connection::ConnectionRegistry;
use crate::dispatch::handler::{Handled, RequestContext, SideEffect, is_usable_token};
use crate::error::RequestError;
use crate::message::{Envelope, builder};

/// How the client proves its identity.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// An existing access token.
    Token(String),
    /// Email-or-username and password.
    Credentials {
        /// Email or username.
        identifier: String,
        /// Password.
        password: String,
    },
    /// Create an account.
    Register(RegistrationFields),
    /// Create an anonymous session.
    Anonymous {
        /// Optional display name.
        nickname: Option<String>,
        /// Optional avatar.
        avatar_id: Option<i64>,
    },
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(alias = "identifier", rename = "emailOrUsername")]
    identifier: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnonymousData {
    nickname: Option<String>,
    avatar_id: Option<i64>,
}

impl AuthMethod {
    /// Parse the method of an `authenticate` envelope.
    ///
    /// Returns `None` for unknown methods or missing method data.
    pub fn from_request(request: &Envelope) -> Option<Self> {
        match request.str_field("method")? {
            "token" => request
                .str_field("token")
                .filter(|t| is_usable_token(t))
                .map(|t| Self::Token(t.to_string())),
            "credentials" => {
                let creds: Credentials =
                    serde_json::from_value(request.field("credentials")?.clone()).ok()?;
                (!creds.identifier.is_empty() && !creds.password.is_empty()).then(|| {
                    Self::Credentials {
                        identifier: creds.identifier,
                        password: creds.password,
                    }
                })
            }
            "register" => {
                let fields: RegistrationFields =
                    serde_json::from_value(request.field("userData")?.clone()).ok()?;
                let complete = !fields.email.is_empty()
                    && !fields.username.is_empty()
                    && !fields.password.is_empty();
                complete.then_some(Self::Register(fields))
            }
            "anonymous" => {
                let data = match request.field("userData") {
                    None | Some(Value::Null) => AnonymousData::default(),
                    Some(raw) => serde_json::from_value(raw.clone()).ok()?,
                };
                Some(Self::Anonymous {
                    nickname: data.nickname.filter(|n| !n.is_empty()),
                    avatar_id: data.avatar_id,
                })
            }
            _ => None,
        }
    }

    /// Wire name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Credentials { .. } => "credentials",
            Self::Register(_) => "register",
            Self::Anonymous { .. } => "anonymous",
        }
    }

    /// `type` of the success reply.
    pub fn reply_type(&self) -> &'static str {
        match self {
            Self::Token(_) => "auth_success",
            Self::Credentials { .. } => "login_success",
            Self::Register(_) => "registration_success",
            Self::Anonymous { .. } => "anonymous_login_success",
        }
    }

    /// Phase named in failure messages.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Token(_) => "Authentication",
            Self::Credentials { .. } => "Login",
            Self::Register(_) => "Registration",
            Self::Anonymous { .. } => "Anonymous login",
        }
    }
}

/// Clears the authenticating flag however the handshake ends, including
/// cancellation by the request timeout.
struct PendingHandshake<'a> {
    registry: &'a ConnectionRegistry,
    id: ConnectionId,
}

impl<'a> PendingHandshake<'a> {
    fn begin(registry: &'a ConnectionRegistry, id: ConnectionId) -> Self {
        registry.begin_handshake(id);
        Self { registry, id }
    }
}

impl Drop for PendingHandshake<'_> {
    fn drop(&mut self) {
        self.registry.end_handshake(self.id);
    }
}

/// Run the handshake for `request` on the requesting connection.
///
/// On success the connection is bound, the reply carries the session, and
/// an online presence announcement follows.
pub async fn authenticate(
    ctx: &RequestContext,
    request: &Envelope,
) -> Result<Handled, RequestError> {
    let method = AuthMethod::from_request(request)
        .ok_or_else(|| RequestError::AuthFailure("Invalid authentication method".to_string()))?;
    let conn_id = ctx.conn_id;
    let _pending = PendingHandshake::begin(&ctx.registry, conn_id);

    let session = establish(ctx, &method)
        .await
        .map_err(|e| RequestError::AuthFailure(format!("{} failed: {}", method.phase(), e.message)))?;
    let user_id = session.user_id().ok_or_else(|| {
        RequestError::AuthFailure(format!("{} failed: user record has no id", method.phase()))
    })?;

    let reply = builder::session_established(method.reply_type(), &user_id, &session);
    if !ctx
        .registry
        .authenticate(conn_id, user_id.clone(), Some(session.token.clone()))
    {
        tracing::debug!(conn_id = %conn_id, "Connection closed during handshake");
        return Ok(Handled::reply(reply));
    }

    if let Some(previous) = ctx.user_id.as_ref().filter(|p| **p != user_id) {
        info!(conn_id = %conn_id, previous = %previous, user_id = %user_id, "Connection re-authenticated as a different user");
    }
    info!(conn_id = %conn_id, user_id = %user_id, method = method.name(), "Connection authenticated");

    Ok(Handled::reply(reply).with_effect(SideEffect::AnnouncePresence {
        user_id,
        online: true,
    }))
}

async fn establish(
    ctx: &RequestContext,
    method: &AuthMethod,
) -> hugmood_core::result::AppResult<AuthSession> {
    let auth = &ctx.backends.auth;
    match method {
        AuthMethod::Token(token) => {
            let user = auth.who_am_i(token).await?;
            Ok(AuthSession {
                token: token.clone(),
                refresh_token: None,
                user,
            })
        }
        AuthMethod::Credentials {
            identifier,
            password,
        } => auth.login(identifier, password).await,
        AuthMethod::Register(fields) => auth.register(fields).await,
        AuthMethod::Anonymous {
            nickname,
            avatar_id,
        } => auth.anonymous_login(nickname.as_deref(), *avatar_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::AuthState;
    use crate::dispatch::testing::Harness;
    use hugmood_core::types::UserId;
    use hugmood_services::mock::MockBackend;
    use serde_json::json;

    fn envelope(raw: Value) -> Envelope {
        serde_json::from_value(raw).unwrap()
    }

    fn method(raw: Value) -> Option<AuthMethod> {
        AuthMethod::from_request(&envelope(raw))
    }

    #[test]
    fn test_method_parsing() {
        assert!(matches!(
            method(json!({"type": "authenticate", "method": "token", "token": "abc"})),
            Some(AuthMethod::Token(t)) if t == "abc"
        ));
        assert!(method(json!({"type": "authenticate", "method": "token", "token": "undefined"})).is_none());
        assert!(matches!(
            method(json!({
                "type": "authenticate",
                "method": "credentials",
                "credentials": {"identifier": "amy", "password": "pw"}
            })),
            Some(AuthMethod::Credentials { identifier, password }) if identifier == "amy" && password == "pw"
        ));
        assert!(matches!(
            method(json!({"type": "authenticate", "method": "anonymous"})),
            Some(AuthMethod::Anonymous { nickname: None, avatar_id: None })
        ));
        assert!(method(json!({"type": "authenticate", "method": "magic"})).is_none());
        assert!(method(json!({"type": "authenticate", "method": "register", "userData": {"email": "a@b.c"}})).is_none());
    }

    #[tokio::test]
    async fn test_anonymous_login_binds_and_announces() {
        let harness = Harness::new();
        let (peer, mut peer_rx) = harness.connect(Some("u9"));
        let (id, mut rx) = harness.connect(None);

        harness
            .request(
                id,
                json!({
                    "type": "authenticate",
                    "method": "anonymous",
                    "userData": {"nickname": "Guest"},
                    "callbackId": "a1"
                }),
            )
            .await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["type"], "anonymous_login_success");
        assert_eq!(replies[0]["userId"], "u1");
        assert_eq!(replies[0]["callbackId"], "a1");
        assert!(replies[0]["token"].is_string());

        let conn = harness.registry.find(id).unwrap();
        assert_eq!(conn.auth_state(), AuthState::Authenticated);
        assert_eq!(conn.user_id, Some(UserId::from("u1")));

        let events = Harness::drain(&mut peer_rx);
        assert_eq!(events[0]["type"], "user_status");
        assert_eq!(events[0]["userId"], "u1");
        assert_eq!(events[0]["isOnline"], true);
        assert!(harness.registry.contains(peer));
    }

    #[tokio::test]
    async fn test_token_method() {
        let mock = MockBackend::new().with_token("good", json!({"id": "u5", "username": "eve"}));
        let harness = Harness::with_mock(mock);
        let (id, mut rx) = harness.connect(None);

        harness
            .request(id, json!({"type": "authenticate", "method": "token", "token": "good"}))
            .await;
        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "auth_success");
        assert_eq!(replies[0]["userId"], "u5");
        assert_eq!(
            harness.registry.find(id).unwrap().session_token.as_deref(),
            Some("good")
        );

        harness
            .request(id, json!({"type": "authenticate", "method": "token", "token": "bad"}))
            .await;
        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "auth_error");
        assert_eq!(replies[0]["message"], "Authentication failed: Invalid token");
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_downstream_message() {
        let mock = MockBackend::new().with_account("amy", "secret", json!({"id": "u7"}));
        let harness = Harness::with_mock(mock);
        let (id, mut rx) = harness.connect(None);

        harness
            .request(
                id,
                json!({
                    "type": "authenticate",
                    "method": "credentials",
                    "credentials": {"emailOrUsername": "amy", "password": "nope"},
                    "callbackId": 3
                }),
            )
            .await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "auth_error");
        assert_eq!(replies[0]["message"], "Login failed: Invalid credentials");
        assert_eq!(replies[0]["callbackId"], 3);

        let conn = harness.registry.find(id).unwrap();
        assert_eq!(conn.auth_state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(None);
        let register = json!({
            "type": "authenticate",
            "method": "register",
            "userData": {"email": "a@b.c", "username": "amy", "password": "pw"}
        });

        harness.request(id, register.clone()).await;
        assert_eq!(Harness::drain(&mut rx)[0]["type"], "registration_success");

        harness.request(id, register).await;
        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "auth_error");
        assert_eq!(
            replies[0]["message"],
            "Registration failed: Username already taken"
        );
        assert_eq!(harness.mock.calls_to("register").len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_method_changes_nothing() {
        let harness = Harness::new();
        let (id, mut rx) = harness.connect(None);

        harness
            .request(id, json!({"type": "authenticate", "method": "telepathy"}))
            .await;

        let replies = Harness::drain(&mut rx);
        assert_eq!(replies[0]["type"], "auth_error");
        assert_eq!(replies[0]["message"], "Invalid authentication method");
        assert!(harness.mock.calls().is_empty());
        assert!(!harness.registry.find(id).unwrap().authenticated);
    }

    #[tokio::test]
    async fn test_reauthentication_overwrites_user() {
        let harness = Harness::new();
        let (id, _rx) = harness.connect(Some("u42"));

        harness
            .request(id, json!({"type": "authenticate", "method": "anonymous"}))
            .await;

        assert_eq!(
            harness.registry.find(id).unwrap().user_id,
            Some(UserId::from("u1"))
        );
        assert!(harness.registry.find_by_user(&UserId::from("u42")).is_empty());
    }
}
