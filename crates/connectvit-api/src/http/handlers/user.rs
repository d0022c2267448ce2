//! User account HTTP handlers.
//!
//! Endpoints:
//! - POST /api/signup       - Register a student account
//! - POST /api/login        - Verify credentials
//! - GET  /api/users        - List users
//! - GET  /api/user-profile - Profile with bio
//! - POST /api/update-bio   - Replace a user's bio

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use connectvit_types::user::{LoginRequest, SignupRequest, User, UserProfile};

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBioRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: String,
}

/// POST /api/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.user_service.signup(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Sign-up successful!" })),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .user_service
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(json!({ "message": "Login successful!", "user": user })))
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.user_service.list_users().await?))
}

/// GET /api/user-profile?username=
pub async fn user_profile(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.user_service.profile(&query.username).await?))
}

/// POST /api/update-bio
pub async fn update_bio(
    State(state): State<AppState>,
    Json(request): Json<UpdateBioRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .user_service
        .update_bio(&request.username, &request.bio)
        .await?;
    Ok(Json(json!({ "message": "Bio updated successfully!" })))
}
