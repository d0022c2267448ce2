//! SQLite post repository implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use connectvit_core::repository::PostRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::post::{LikeAction, NewPost, Post};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, stored_datetime};
use crate::error::query_error;

/// SQLite-backed implementation of `PostRepository`.
#[derive(Clone)]
pub struct SqlitePostRepository {
    pool: DatabasePool,
}

impl SqlitePostRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn post_from(row: &sqlx::sqlite::SqliteRow) -> Result<Post, RepositoryError> {
    let timestamp: String = row.try_get("timestamp").map_err(query_error)?;
    Ok(Post {
        id: row.try_get("id").map_err(query_error)?,
        username: row.try_get("username").map_err(query_error)?,
        caption: row.try_get("caption").map_err(query_error)?,
        image_url: row.try_get("image_url").map_err(query_error)?,
        timestamp: parse_datetime(&timestamp)?,
        likes: Vec::new(),
    })
}

impl PostRepository for SqlitePostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, username, caption, image_url, timestamp FROM posts ORDER BY timestamp DESC, id DESC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        let mut posts = rows.iter().map(post_from).collect::<Result<Vec<_>, _>>()?;

        let likes: Vec<(i64, String)> =
            sqlx::query_as("SELECT post_id, username FROM post_likes ORDER BY id ASC")
                .fetch_all(&self.pool.reader)
                .await
                .map_err(query_error)?;
        let mut by_post: HashMap<i64, Vec<String>> = HashMap::new();
        for (post_id, username) in likes {
            by_post.entry(post_id).or_default().push(username);
        }
        for post in &mut posts {
            post.likes = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(posts)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let (timestamp_text, timestamp) = stored_datetime(&post.timestamp)?;
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO posts (username, caption, image_url, timestamp)
               VALUES (?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(&post.username)
        .bind(&post.caption)
        .bind(&post.image_url)
        .bind(&timestamp_text)
        .fetch_one(&self.pool.writer)
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
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
            .bind(post_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(found != 0)
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<LikeAction, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND username = ?")
            .bind(post_id)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();

        let action = if removed > 0 {
            LikeAction::Unliked
        } else {
            sqlx::query("INSERT INTO post_likes (post_id, username, timestamp) VALUES (?, ?, ?)")
                .bind(post_id)
                .bind(username)
                .bind(format_datetime(&at))
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
            LikeAction::Liked
        };

        tx.commit().await.map_err(query_error)?;
        Ok(action)
    }

    async fn get_likes(&self, post_id: i64) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar("SELECT username FROM post_likes WHERE post_id = ? ORDER BY id ASC")
            .bind(post_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)
    }
}
