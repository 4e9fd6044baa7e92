//! Built-in request handlers, one per request type.

mod authenticate;
mod fetch;
mod hug;
mod mood;
mod ping;
mod social;

use std::sync::Arc;

pub use authenticate::AuthenticateHandler;
pub use fetch::FetchDataHandler;
pub use hug::{CreateGroupHugHandler, RequestHugHandler, SendHugHandler};
pub use mood::UpdateMoodHandler;
pub use ping::PingHandler;
pub use social::{FollowUserHandler, SocialShareHandler};

use super::handler::RequestHandler;

/// Every built-in handler.
pub fn defaults() -> Vec<Arc<dyn RequestHandler>> {
    vec![
        Arc::new(PingHandler),
        Arc::new(AuthenticateHandler),
        Arc::new(FetchDataHandler),
        Arc::new(UpdateMoodHandler),
        Arc::new(SendHugHandler),
        Arc::new(RequestHugHandler),
        Arc::new(CreateGroupHugHandler),
        Arc::new(FollowUserHandler),
        Arc::new(SocialShareHandler),
    ]
}
