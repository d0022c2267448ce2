//! Message history HTTP handlers.
//!
//! Live delivery happens over `/ws`; these endpoints serve stored history.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use connectvit_types::message::{ChatSummary, DirectMessage, GroupMessage};

use super::user::UsernameQuery;
use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
}

/// GET /api/messages?sender=&receiver=
pub async fn direct_messages(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<DirectMessage>>, AppError> {
    let messages = state
        .history_service
        .direct_messages(&query.sender, &query.receiver)
        .await?;
    Ok(Json(messages))
}

/// GET /api/chat-history?username=
pub async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Vec<ChatSummary>>, AppError> {
    Ok(Json(state.history_service.chat_history(&query.username).await?))
}

/// GET /api/groups/{id}/messages
pub async fn group_messages(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<GroupMessage>>, AppError> {
    Ok(Json(state.history_service.group_messages(group_id).await?))
}
