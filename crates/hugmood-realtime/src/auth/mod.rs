//! Authentication handshake.

pub mod handshake;

pub use handshake::{AuthMethod, authenticate};
