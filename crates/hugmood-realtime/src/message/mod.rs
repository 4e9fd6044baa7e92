//! Wire envelope, codec, and server message constructors.

pub mod builder;
pub mod codec;
pub mod envelope;

pub use codec::{decode, encode};
pub use envelope::Envelope;
