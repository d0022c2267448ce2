use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /
pub async fn root() -> &'static str {
    "ConnectVit Backend is Running!"
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": state.gateway.backend(),
        "sessions": state.sessions.active_count(),
        "rooms": state.messaging.registry().room_count(),
    }))
}
