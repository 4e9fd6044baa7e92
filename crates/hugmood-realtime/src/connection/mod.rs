//! Live connection tracking: outbound handles and the registry.

pub mod handle;
pub mod registry;

pub use handle::{CLOSE_GOING_AWAY, CLOSE_NORMAL, ConnectionHandle, Frame};
pub use registry::{AuthState, Connection, ConnectionRegistry, Removal};
