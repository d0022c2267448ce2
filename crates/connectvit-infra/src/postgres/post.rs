//! PostgreSQL post repository implementation.

use chrono::{DateTime, Utc};
use connectvit_core::repository::PostRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::post::{LikeAction, NewPost, Post};
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::pool::PgDatabasePool;
use super::stored_datetime;
use crate::error::query_error;

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgDatabasePool,
}

impl PgPostRepository {
    pub fn new(pool: PgDatabasePool) -> Self {
        Self { pool }
    }
}

fn post_from(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        caption: row.try_get("caption")?,
        image_url: row.try_get("image_url")?,
        timestamp: row.try_get("timestamp")?,
        likes: row.try_get("likes")?,
    })
}

impl PostRepository for PgPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT p.id, p.username, p.caption, p.image_url, p.timestamp,
                      COALESCE(
                          ARRAY_AGG(l.username ORDER BY l.id) FILTER (WHERE l.username IS NOT NULL),
                          ARRAY[]::TEXT[]
                      ) AS likes
               FROM posts p
               LEFT JOIN post_likes l ON l.post_id = p.id
               GROUP BY p.id
               ORDER BY p.timestamp DESC, p.id DESC"#,
        )
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(post_from)
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let timestamp = stored_datetime(&post.timestamp);
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO posts (username, caption, image_url, timestamp)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&post.username)
        .bind(&post.caption)
        .bind(&post.image_url)
        .bind(timestamp)
        .fetch_one(&self.pool.pool)
        .await
        .map_err(query_error)?;

        Ok(Post {
            id,
            username: post.username.clone(),
            caption: post.caption.clone(),
            image_url: post.image_url.clone(),
            timestamp,
            likes: Vec::new(),
        })
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, RepositoryError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool.pool)
            .await
            .map_err(query_error)
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<LikeAction, RepositoryError> {
        let mut tx = self.pool.pool.begin().await.map_err(query_error)?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND username = $2")
            .bind(post_id)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();

        let action = if removed > 0 {
            LikeAction::Unliked
        } else {
            sqlx::query(
                r#"INSERT INTO post_likes (post_id, username, timestamp)
                   VALUES ($1, $2, $3)
                   ON CONFLICT (post_id, username) DO NOTHING"#,
            )
            .bind(post_id)
            .bind(username)
            .bind(at)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
            LikeAction::Liked
        };

        tx.commit().await.map_err(query_error)?;
        Ok(action)
    }

    async fn get_likes(&self, post_id: i64) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar("SELECT username FROM post_likes WHERE post_id = $1 ORDER BY id ASC")
            .bind(post_id)
            .fetch_all(&self.pool.pool)
            .await
            .map_err(query_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::postgres::test_pool;

    #[tokio::test]
    async fn feed_and_likes() {
        let Some((_guard, pool)) = test_pool().await else {
            return;
        };
        let repo = PgPostRepository::new(pool);
        let post = repo
            .create_post(&NewPost {
                username: "alice".to_string(),
                caption: Some("campus at dusk".to_string()),
                image_url: "https://img.example/a.jpg".to_string(),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(repo.list_posts().await.unwrap()[0].likes, Vec::<String>::new());
        assert_eq!(
            repo.toggle_like(post.id, "bob", Utc::now()).await.unwrap(),
            LikeAction::Liked
        );
        assert_eq!(repo.list_posts().await.unwrap()[0].likes, vec!["bob".to_string()]);
        assert_eq!(
            repo.toggle_like(post.id, "bob", Utc::now()).await.unwrap(),
            LikeAction::Unliked
        );
        assert!(repo.get_likes(post.id).await.unwrap().is_empty());
    }
}
