//! Group HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/groups?username=       - Groups of a user, with admin flag
//! - GET  /api/all-groups             - Every group with its member count
//! - POST /api/groups/create          - Create a group (creator becomes admin)
//! - GET  /api/groups/{id}            - Group details and members
//! - POST /api/groups/{id}/members    - Add a member
//! - POST /api/groups/{id}/leave      - Leave a group

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use connectvit_types::group::{
    AddMemberRequest, CreateGroupRequest, GroupDetails, GroupListing, LeaveOutcome, UserGroup,
};

use super::user::UsernameQuery;
use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LeaveGroupRequest {
    #[serde(default)]
    pub username: String,
}

/// GET /api/groups?username=
pub async fn user_groups(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Vec<UserGroup>>, AppError> {
    Ok(Json(state.group_service.user_groups(&query.username).await?))
}

/// GET /api/all-groups
pub async fn all_groups(State(state): State<AppState>) -> Result<Json<Vec<GroupListing>>, AppError> {
    Ok(Json(state.group_service.all_groups().await?))
}

/// POST /api/groups/create
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let group = state.group_service.create_group(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Group created successfully", "group_id": group.id })),
    ))
}

/// GET /api/groups/{id}
pub async fn group_details(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupDetails>, AppError> {
    Ok(Json(state.group_service.details(group_id).await?))
}

/// POST /api/groups/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Json<Value>, AppError> {
    state.group_service.add_member(group_id, request).await?;
    Ok(Json(json!({ "message": "Member added successfully" })))
}

/// POST /api/groups/{id}/leave
pub async fn leave_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Json(request): Json<LeaveGroupRequest>,
) -> Result<Json<Value>, AppError> {
    let message = match state.group_service.leave(group_id, &request.username).await? {
        LeaveOutcome::Left => "Left group successfully",
        LeaveOutcome::GroupDeleted => "Left group successfully; group deleted as no members remain",
    };
    Ok(Json(json!({ "message": message })))
}
