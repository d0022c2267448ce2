//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. Timestamps are stored as RFC 3339 text.

pub mod group;
pub mod message;
pub mod pool;
pub mod post;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};
use connectvit_types::error::RepositoryError;

pub use group::SqliteGroupRepository;
pub use message::SqliteMessageRepository;
pub use pool::DatabasePool;
pub use post::SqlitePostRepository;
pub use user::SqliteUserRepository;

/// All SQLite repositories over one pool.
#[derive(Clone)]
pub struct SqliteGateway {
    pub pool: DatabasePool,
    pub messages: SqliteMessageRepository,
    pub groups: SqliteGroupRepository,
    pub users: SqliteUserRepository,
    pub posts: SqlitePostRepository,
}

impl SqliteGateway {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            messages: SqliteMessageRepository::new(pool.clone()),
            groups: SqliteGroupRepository::new(pool.clone()),
            users: SqliteUserRepository::new(pool.clone()),
            posts: SqlitePostRepository::new(pool.clone()),
            pool,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed width, so text ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The timestamp as it will read back from storage.
pub(crate) fn stored_datetime(dt: &DateTime<Utc>) -> Result<(String, DateTime<Utc>), RepositoryError> {
    let text = format_datetime(dt);
    let parsed = parse_datetime(&text)?;
    Ok((text, parsed))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> (tempfile::TempDir, DatabasePool) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let pool = DatabasePool::new(&url).await.unwrap();
    (dir, pool)
}
