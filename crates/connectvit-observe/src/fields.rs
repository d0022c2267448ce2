//! Span and event field names used across the realtime surface.
//!
//! Keeping them in one place lets log queries rely on stable keys.

/// Opaque per-connection identifier.
pub const SESSION_ID: &str = "connectvit.session.id";

/// Inbound client event name (`joinRoom`, `sendMessage`, ...).
pub const EVENT_NAME: &str = "connectvit.event.name";

/// Peer address of the WebSocket connection.
pub const PEER_ADDR: &str = "connectvit.peer.addr";

// --- Span names ---

/// One WebSocket connection, open to close.
pub const SPAN_SESSION: &str = "ws_session";

/// Handling a single inbound frame.
pub const SPAN_FRAME: &str = "ws_frame";
