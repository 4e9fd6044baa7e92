//! Downstream backend service endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// GraphQL endpoints of the domain backends the gateway fronts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Auth service (identity lookup, login, registration, anonymous sessions).
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// User/social graph service.
    #[serde(default = "default_user_url")]
    pub user_url: String,
    /// Mood tracking service.
    #[serde(default = "default_mood_url")]
    pub mood_url: String,
    /// Hug exchange service.
    #[serde(default = "default_hug_url")]
    pub hug_url: String,
    /// HTTP timeout applied to every downstream call, in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            user_url: default_user_url(),
            mood_url: default_mood_url(),
            hug_url: default_hug_url(),
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

impl ServicesConfig {
    /// HTTP timeout as a `Duration`.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

fn default_auth_url() -> String {
    "http://localhost:4001/graphql".to_string()
}

fn default_user_url() -> String {
    "http://localhost:4002/graphql".to_string()
}

fn default_mood_url() -> String {
    "http://localhost:4003/graphql".to_string()
}

fn default_hug_url() -> String {
    "http://localhost:4004/graphql".to_string()
}

fn default_http_timeout() -> u64 {
    15
}
