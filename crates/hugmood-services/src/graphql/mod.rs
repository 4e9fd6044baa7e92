//! GraphQL-over-HTTP implementations of the service traits.

pub mod auth;
pub mod client;
pub mod hug;
pub mod mood;
pub(crate) mod queries;
pub mod social;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::GraphqlAuthService;
pub use client::GraphqlClient;
pub use hug::GraphqlHugService;
pub use mood::GraphqlMoodService;
pub use social::GraphqlSocialService;

use hugmood_core::error::AppError;
use hugmood_core::result::AppResult;
use serde_json::Value;

use crate::types::AuthSession;

/// Decode a session-issuing mutation result.
pub(crate) fn session_from(operation: &str, value: Value) -> AppResult<AuthSession> {
    serde_json::from_value(value).map_err(|e| {
        AppError::external_service(format!("{operation} returned a malformed session: {e}"))
    })
}
