//! User repository trait definition.

use chrono::{DateTime, Utc};
use connectvit_types::error::RepositoryError;
use connectvit_types::user::{NewUser, User};

/// Repository trait for user accounts and bios.
pub trait UserRepository: Send + Sync {
    /// Insert a user. Duplicate username or email is a `RepositoryError::Conflict`.
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn list_users(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    fn get_bio(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Insert or replace the bio for `username`.
    fn upsert_bio(
        &self,
        username: &str,
        bio: &str,
        updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
