//! # hugmood-realtime
//!
//! Real-time WebSocket gateway engine for HugMood. Provides:
//!
//! - Connection registry indexed by connection and by user
//! - Multi-method authentication handshake
//! - Request dispatch with per-request timeouts and callback correlation
//! - Targeted delivery and community broadcast
//! - Idle connection sweeping

pub mod auth;
pub mod broadcast;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod metrics;
pub mod server;
pub mod sweeper;

pub use broadcast::Broadcaster;
pub use connection::{ConnectionHandle, ConnectionRegistry, Frame};
pub use dispatch::{Dispatcher, RequestHandler};
pub use error::{DecodeError, RequestError};
pub use message::Envelope;
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use server::{GatewayEngine, GatewayStats};
pub use sweeper::Sweeper;
