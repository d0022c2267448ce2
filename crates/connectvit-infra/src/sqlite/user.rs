//! SQLite user repository implementation.

use chrono::{DateTime, Utc};
use connectvit_core::repository::UserRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::user::{NewUser, User};
use sqlx::Row;

use super::format_datetime;
use super::pool::DatabasePool;
use crate::error::{conflict_or_query, query_error};

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn user_from(row: &sqlx::sqlite::SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        date_of_joining: row.try_get("date_of_joining")?,
    })
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO users (full_name, username, email, password_hash, date_of_joining)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.date_of_joining)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| conflict_or_query(e, "username or email already exists"))?;

        Ok(User {
            id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            date_of_joining: user.date_of_joining.clone(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(user_from).transpose().map_err(query_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(user_from)
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn get_bio(&self, username: &str) -> Result<Option<String>, RepositoryError> {
        sqlx::query_scalar("SELECT bio FROM user_bio WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)
    }

    async fn upsert_bio(
        &self,
        username: &str,
        bio: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_bio (username, bio, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT (username) DO UPDATE
               SET bio = excluded.bio, updated_at = excluded.updated_at"#,
        )
        .bind(username)
        .bind(bio)
        .bind(format_datetime(&updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }
}
