//! PostgreSQL user repository implementation.

use chrono::{DateTime, Utc};
use connectvit_core::repository::UserRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::user::{NewUser, User};
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::pool::PgDatabasePool;
use crate::error::{conflict_or_query, query_error};

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgDatabasePool,
}

impl PgUserRepository {
    pub fn new(pool: PgDatabasePool) -> Self {
        Self { pool }
    }
}

fn user_from(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        date_of_joining: row.try_get("date_of_joining")?,
    })
}

impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO users (full_name, username, email, password_hash, date_of_joining)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.date_of_joining)
        .fetch_one(&self.pool.pool)
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
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool.pool)
            .await
            .map_err(query_error)?;

        row.as_ref().map(user_from).transpose().map_err(query_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool.pool)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(user_from)
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn get_bio(&self, username: &str) -> Result<Option<String>, RepositoryError> {
        sqlx::query_scalar("SELECT bio FROM user_bio WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool.pool)
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
               VALUES ($1, $2, $3)
               ON CONFLICT (username) DO UPDATE
               SET bio = EXCLUDED.bio, updated_at = EXCLUDED.updated_at"#,
        )
        .bind(username)
        .bind(bio)
        .bind(updated_at)
        .execute(&self.pool.pool)
        .await
        .map_err(query_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::postgres::test_pool;

    #[tokio::test]
    async fn signup_conflict_and_bio() {
        let Some((_guard, pool)) = test_pool().await else {
            return;
        };
        let repo = PgUserRepository::new(pool);
        let user = NewUser {
            full_name: "Alice Anand".to_string(),
            username: "alice".to_string(),
            email: "alice@vitstudent.ac.in".to_string(),
            password_hash: "x".to_string(),
            date_of_joining: "01-01-2025".to_string(),
        };

        let created = repo.create_user(&user).await.unwrap();
        assert_eq!(repo.get_user_by_username("alice").await.unwrap(), Some(created));
        assert!(matches!(
            repo.create_user(&user).await,
            Err(RepositoryError::Conflict(_))
        ));

        repo.upsert_bio("alice", "first", Utc::now()).await.unwrap();
        repo.upsert_bio("alice", "second", Utc::now()).await.unwrap();
        assert_eq!(repo.get_bio("alice").await.unwrap().as_deref(), Some("second"));
    }
}
