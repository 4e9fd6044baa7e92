use async_trait::async_trait;

use crate::auth::{self, AuthMethod};
use crate::dispatch::handler::{Handled, RequestContext, RequestHandler};
use crate::error::RequestError;
use crate::message::Envelope;

/// Entry point of the handshake.
#[derive(Debug, Default)]
pub struct AuthenticateHandler;

#[async_trait]
impl RequestHandler for AuthenticateHandler {
    fn request_type(&self) -> &'static str {
        "authenticate"
    }

    fn requires_auth(&self) -> bool {
        false
    }

    fn error_type(&self) -> &'static str {
        "auth_error"
    }

    fn failure_prefix(&self, request: &Envelope) -> String {
        let phase = AuthMethod::from_request(request).map_or("Authentication", |m| m.phase());
        format!("{phase} failed")
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        auth::authenticate(ctx, request).await
    }
}
