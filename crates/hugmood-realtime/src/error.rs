//! Error taxonomy of the real-time protocol.
//!
//! None of these close the connection; they are reported to the originating
//! connection only.

use std::time::Duration;

use hugmood_core::error::AppError;

/// A frame that could not be decoded into an envelope.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Frame exceeds the configured size limit.
    #[error("message of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Frame size in bytes.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// Frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Frame is valid JSON but not an object.
    #[error("message is not a JSON object")]
    NotAnObject,
    /// Object has no string `type` discriminator.
    #[error("message has no string `type` field")]
    MissingType,
}

/// A request that could not be completed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    /// Malformed envelope that cannot be attributed to a request.
    #[error("Invalid message format")]
    Protocol,
    /// Authenticated-only request on an unauthenticated connection.
    #[error("Authentication required")]
    AuthRequired,
    /// Handshake rejected; the message is already phase-prefixed.
    #[error("{0}")]
    AuthFailure(String),
    /// No handler is registered for the type.
    #[error("Unrecognized message type")]
    UnknownRequestType(String),
    /// A backend call failed.
    #[error("{}", .0.message)]
    Downstream(#[from] AppError),
    /// The handler did not finish within the request timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Request fields failed validation.
    #[error("{0}")]
    InvalidPayload(String),
}

impl From<DecodeError> for RequestError {
    fn from(_: DecodeError) -> Self {
        Self::Protocol
    }
}

impl RequestError {
    /// Whether the reply message is prefixed with the operation's failure text.
    pub fn takes_prefix(&self) -> bool {
        matches!(self, Self::Downstream(_) | Self::Timeout(_))
    }
}
