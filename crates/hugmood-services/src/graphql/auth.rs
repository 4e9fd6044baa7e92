//! Auth service client.

use async_trait::async_trait;
use serde_json::{Value, json};

use hugmood_core::result::AppResult;

use super::{GraphqlClient, queries, session_from};
use crate::traits::AuthService;
use crate::types::{AuthSession, RegistrationFields};

/// [`AuthService`] backed by the auth GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlAuthService {
    client: GraphqlClient,
}

impl GraphqlAuthService {
    /// Create a new auth client.
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for GraphqlAuthService {
    async fn who_am_i(&self, token: &str) -> AppResult<Value> {
        self.client
            .execute_required("me", &queries::me(), json!({}), Some(token), "Invalid token")
            .await
    }

    async fn login(&self, identifier: &str, password: &str) -> AppResult<AuthSession> {
        let value = self
            .client
            .execute_required(
                "login",
                &queries::login(),
                json!({ "emailOrUsername": identifier, "password": password }),
                None,
                "Login failed",
            )
            .await?;
        session_from("login", value)
    }

    async fn register(&self, fields: &RegistrationFields) -> AppResult<AuthSession> {
        let value = self
            .client
            .execute_required(
                "register",
                &queries::register(),
                json!({
                    "email": fields.email,
                    "username": fields.username,
                    "password": fields.password,
                    "name": fields.display_name(),
                }),
                None,
                "Registration failed",
            )
            .await?;
        session_from("register", value)
    }

    async fn anonymous_login(
        &self,
        nickname: Option<&str>,
        avatar_id: Option<i64>,
    ) -> AppResult<AuthSession> {
        let value = self
            .client
            .execute_required(
                "anonymousLogin",
                &queries::anonymous_login(),
                json!({ "nickname": nickname, "avatarId": avatar_id }),
                None,
                "Anonymous login failed",
            )
            .await?;
        session_from("anonymousLogin", value)
    }
}
