use async_trait::async_trait;
use chrono::Utc;

use crate::dispatch::handler::{Handled, RequestContext, RequestHandler};
use crate::error::RequestError;
use crate::message::{Envelope, builder};

/// Liveness probe; open to unauthenticated connections.
#[derive(Debug, Default)]
pub struct PingHandler;

#[async_trait]
impl RequestHandler for PingHandler {
    fn request_type(&self) -> &'static str {
        "ping"
    }

    fn requires_auth(&self) -> bool {
        false
    }

    fn failure_prefix(&self, _request: &Envelope) -> String {
        "Ping failed".to_string()
    }

    async fn handle(
        &self,
        _ctx: &RequestContext,
        _request: &Envelope,
    ) -> Result<Handled, RequestError> {
        Ok(Handled::reply(builder::pong(Utc::now())))
    }
}
