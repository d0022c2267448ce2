use thiserror::Error;

use crate::session::SessionId;

/// Errors from repository operations (used by trait definitions in connectvit-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from conversation addressing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("identity must not be empty")]
    EmptyIdentity,

    #[error("identity '{0}' contains the reserved separator ':'")]
    ReservedSeparator(String),

    #[error("malformed room id: '{0}'")]
    MalformedRoom(String),
}

/// Errors surfaced by the real-time messaging core.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Malformed input: empty sender/receiver/body or an invalid identity.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The sender is not a durable member of the target group.
    #[error("'{username}' is not a member of group {group_id}")]
    NotAMember { username: String, group_id: i64 },

    /// The durable write (or a lookup it depends on) failed or timed out.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// A member connection was found dead during delivery.
    #[error("stale session {0}")]
    StaleSession(SessionId),

    /// The session has left the ACTIVE state and accepts no more requests.
    #[error("session {0} is closed")]
    SessionClosed(SessionId),
}

impl MessagingError {
    /// Machine-readable code sent to clients in `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            MessagingError::InvalidMessage(_) => "INVALID_MESSAGE",
            MessagingError::NotAMember { .. } => "NOT_A_MEMBER",
            MessagingError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            MessagingError::StaleSession(_) => "STALE_SESSION",
            MessagingError::SessionClosed(_) => "SESSION_CLOSED",
        }
    }
}

impl From<AddressError> for MessagingError {
    fn from(e: AddressError) -> Self {
        MessagingError::InvalidMessage(e.to_string())
    }
}

/// Errors related to user accounts and profiles.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("username or email already exists")]
    AlreadyExists,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("password hashing failed")]
    Hashing,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to group management.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group not found")]
    NotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("user is not a member of this group")]
    NotAMember,

    #[error("user is already a member of this group")]
    AlreadyMember,

    #[error("only group admins can add members")]
    NotAdmin,

    #[error("cannot leave group as the only admin; promote another member to admin first")]
    LastAdmin,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to posts and likes.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    StorageError(String),
}
