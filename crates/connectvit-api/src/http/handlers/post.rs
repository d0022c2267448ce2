//! Photo feed HTTP handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use connectvit_types::post::{CreatePostRequest, LikeAction, Post};

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    #[serde(default)]
    pub username: String,
}

/// GET /api/posts
pub async fn feed(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.post_service.feed().await?))
}

/// POST /api/posts/create
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let post = state.post_service.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created successfully", "post": post })),
    ))
}

/// POST /api/posts/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(request): Json<LikeRequest>,
) -> Result<Json<Value>, AppError> {
    let (action, likes) = state
        .post_service
        .toggle_like(post_id, &request.username)
        .await?;
    let message = match action {
        LikeAction::Liked => "Post liked successfully",
        LikeAction::Unliked => "Post unliked successfully",
    };
    Ok(Json(json!({ "message": message, "likes": likes })))
}
