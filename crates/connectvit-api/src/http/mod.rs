//! HTTP layer for ConnectVit.
//!
//! Axum REST API under `/api`, the realtime WebSocket at `/ws`, and CORS.

pub mod error;
pub mod handlers;
pub mod router;
