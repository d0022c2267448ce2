//! PostgreSQL storage layer.
//!
//! Same repository traits as the SQLite layer, over a single `PgPool`.
//! Timestamps are `TIMESTAMPTZ` columns decoded straight into `DateTime<Utc>`.

pub mod group;
pub mod message;
pub mod pool;
pub mod post;
pub mod user;

use chrono::{DateTime, SubsecRound, Utc};

pub use group::PgGroupRepository;
pub use message::PgMessageRepository;
pub use pool::PgDatabasePool;
pub use post::PgPostRepository;
pub use user::PgUserRepository;

/// All PostgreSQL repositories over one pool.
#[derive(Clone)]
pub struct PgGateway {
    pub pool: PgDatabasePool,
    pub messages: PgMessageRepository,
    pub groups: PgGroupRepository,
    pub users: PgUserRepository,
    pub posts: PgPostRepository,
}

impl PgGateway {
    pub fn new(pool: PgDatabasePool) -> Self {
        Self {
            messages: PgMessageRepository::new(pool.clone()),
            groups: PgGroupRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            posts: PgPostRepository::new(pool.clone()),
            pool,
        }
    }
}

/// `TIMESTAMPTZ` keeps microseconds.
pub(crate) fn stored_datetime(dt: &DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(6)
}

/// Connection string for the opt-in PostgreSQL tests.
#[cfg(test)]
pub(crate) const TEST_URL_ENV: &str = "CONNECTVIT_TEST_POSTGRES_URL";

#[cfg(test)]
static TEST_DB: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// A migrated, emptied pool, or `None` when no test server is configured.
///
/// Tests share one database, so the guard serializes them.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<(tokio::sync::MutexGuard<'static, ()>, PgDatabasePool)> {
    let url = std::env::var(TEST_URL_ENV).ok()?;
    let guard = TEST_DB.lock().await;
    let pool = PgDatabasePool::new(&url).await.unwrap();
    sqlx::query(
        "TRUNCATE users, user_bio, messages, groups, group_members, group_messages, posts, post_likes RESTART IDENTITY CASCADE",
    )
    .execute(&pool.pool)
    .await
    .unwrap();
    Some((guard, pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_datetime_truncates_to_micros() {
        let dt: DateTime<Utc> = "2025-03-01T10:00:00.123456789Z".parse().unwrap();
        assert_eq!(stored_datetime(&dt).timestamp_subsec_nanos(), 123_456_000);
    }
}
