//! Post repository trait definition.

use chrono::{DateTime, Utc};
use connectvit_types::error::RepositoryError;
use connectvit_types::post::{LikeAction, NewPost, Post};

/// Repository trait for posts and likes.
pub trait PostRepository: Send + Sync {
    /// All posts, newest first, each with its likers.
    fn list_posts(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, RepositoryError>> + Send;

    fn create_post(
        &self,
        post: &NewPost,
    ) -> impl std::future::Future<Output = Result<Post, RepositoryError>> + Send;

    fn post_exists(
        &self,
        post_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Add the like if absent, remove it if present.
    fn toggle_like(
        &self,
        post_id: i64,
        username: &str,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<LikeAction, RepositoryError>> + Send;

    /// Usernames that like `post_id`.
    fn get_likes(
        &self,
        post_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;
}
