//! Storage error mapping shared by both SQL backends.

use connectvit_types::error::{AddressError, RepositoryError};
use thiserror::Error;

/// Errors raised while opening a storage gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unsupported database url '{0}' (expected sqlite:// or postgres://)")]
    UnsupportedUrl(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Map a sqlx error to the repository taxonomy.
pub(crate) fn query_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::warn!(error = %e, "database connection unavailable");
            RepositoryError::Connection
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::Query(other.to_string()),
    }
}

/// Like [`query_error`], but a UNIQUE violation becomes `Conflict(what)`.
pub(crate) fn conflict_or_query(e: sqlx::Error, what: impl Into<String>) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(what.into())
        }
        _ => query_error(e),
    }
}

/// A room id that does not name a conversation cannot be queried.
pub(crate) fn address_error(e: AddressError) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}
