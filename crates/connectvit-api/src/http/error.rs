//! Application error type mapping domain errors to HTTP status codes.
//!
//! Error bodies are `{"error": "<message>", "code": "<CODE>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use connectvit_types::error::{GroupError, MessagingError, PostError, UserError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    User(UserError),
    Group(GroupError),
    Post(PostError),
    Messaging(MessagingError),
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<GroupError> for AppError {
    fn from(e: GroupError) -> Self {
        AppError::Group(e)
    }
}

impl From<PostError> for AppError {
    fn from(e: PostError) -> Self {
        AppError::Post(e)
    }
}

impl From<MessagingError> for AppError {
    fn from(e: MessagingError) -> Self {
        AppError::Messaging(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::User(e) => match e {
                UserError::NotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                UserError::AlreadyExists => (StatusCode::CONFLICT, "USER_EXISTS"),
                UserError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                UserError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                UserError::Hashing | UserError::StorageError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR")
                }
            },
            AppError::Group(e) => match e {
                GroupError::NotFound => (StatusCode::NOT_FOUND, "GROUP_NOT_FOUND"),
                GroupError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                GroupError::NotAMember => (StatusCode::NOT_FOUND, "NOT_A_MEMBER"),
                GroupError::AlreadyMember => (StatusCode::CONFLICT, "ALREADY_MEMBER"),
                GroupError::NotAdmin => (StatusCode::FORBIDDEN, "NOT_ADMIN"),
                GroupError::LastAdmin => (StatusCode::BAD_REQUEST, "LAST_ADMIN"),
                GroupError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                GroupError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "GROUP_ERROR"),
            },
            AppError::Post(e) => match e {
                PostError::NotFound => (StatusCode::NOT_FOUND, "POST_NOT_FOUND"),
                PostError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                PostError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "POST_ERROR"),
            },
            AppError::Messaging(e) => {
                let status = match e {
                    MessagingError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
                    MessagingError::NotAMember { .. } => StatusCode::FORBIDDEN,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::User(e) => e.to_string(),
            AppError::Group(e) => e.to_string(),
            AppError::Post(e) => e.to_string(),
            AppError::Messaging(e) => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(%code, error = %message, "request failed");
        }
        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::from(UserError::AlreadyExists), StatusCode::CONFLICT),
            (AppError::from(UserError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (AppError::from(GroupError::NotAdmin), StatusCode::FORBIDDEN),
            (AppError::from(GroupError::NotAMember), StatusCode::NOT_FOUND),
            (AppError::from(GroupError::LastAdmin), StatusCode::BAD_REQUEST),
            (AppError::from(PostError::NotFound), StatusCode::NOT_FOUND),
            (
                AppError::from(MessagingError::PersistenceFailure("timeout".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn messaging_errors_keep_wire_codes() {
        let err = AppError::from(MessagingError::NotAMember {
            username: "bob".into(),
            group_id: 3,
        });
        assert_eq!(err.parts(), (StatusCode::FORBIDDEN, "NOT_A_MEMBER"));
        assert!(err.message().contains("bob"));
    }
}
