//! # hugmood-services
//!
//! Uniform async client for the domain backends the gateway fronts:
//!
//! - [`AuthService`]: identity lookup, login, registration, anonymous sessions
//! - [`MoodService`]: mood entries, streaks, analytics and community feed reads
//! - [`SocialService`]: follow graph and profile reads
//! - [`HugService`]: hugs, hug requests, group hugs
//!
//! The production implementation speaks GraphQL over HTTP. With the `mock`
//! feature an in-memory backend is available for tests.

pub mod backends;
pub mod graphql;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use backends::Backends;
pub use traits::{AuthService, HugService, MoodService, SocialService};
pub use types::{
    AuthSession, DataQuery, MoodStreak, NewGroupHug, NewHug, NewHugRequest, NewMood,
    QueryParams, RegistrationFields, ServiceKind, ShareRequest,
};
