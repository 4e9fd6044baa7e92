//! Request dispatch: handler trait, routing table, built-in handlers.

pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod payload;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use handler::{Handled, RequestContext, RequestHandler, SideEffect};
