//! # hugmood-api
//!
//! HTTP layer for the HugMood gateway built on Axum.
//!
//! Mounts the real-time WebSocket endpoint and the health probe, and wraps
//! them in CORS and request tracing middleware.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
