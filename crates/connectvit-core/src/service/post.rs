//! Photo-post feed service.

use chrono::Utc;
use connectvit_types::error::{PostError, RepositoryError};
use connectvit_types::post::{CreatePostRequest, LikeAction, NewPost, Post};
use tracing::debug;

use crate::repository::PostRepository;

pub struct PostService<P: PostRepository> {
    repo: P,
}

impl<P: PostRepository> PostService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    /// All posts, newest first.
    pub async fn feed(&self) -> Result<Vec<Post>, PostError> {
        self.repo.list_posts().await.map_err(storage)
    }

    pub async fn create(&self, request: CreatePostRequest) -> Result<Post, PostError> {
        let username = request.username.trim();
        let image_url = request.image_url.trim();
        if username.is_empty() || image_url.is_empty() {
            return Err(PostError::Validation(
                "username and image are required".to_string(),
            ));
        }
        let post = self
            .repo
            .create_post(&NewPost {
                username: username.to_string(),
                caption: request.caption,
                image_url: image_url.to_string(),
                timestamp: Utc::now(),
            })
            .await
            .map_err(storage)?;
        debug!(post_id = post.id, %username, "post created");
        Ok(post)
    }

    /// Like or unlike. Returns what happened and the updated likers.
    pub async fn toggle_like(
        &self,
        post_id: i64,
        username: &str,
    ) -> Result<(LikeAction, Vec<String>), PostError> {
        if username.trim().is_empty() {
            return Err(PostError::Validation("username is required".to_string()));
        }
        if !self.repo.post_exists(post_id).await.map_err(storage)? {
            return Err(PostError::NotFound);
        }
        let action = self
            .repo
            .toggle_like(post_id, username, Utc::now())
            .await
            .map_err(storage)?;
        let likes = self.repo.get_likes(post_id).await.map_err(storage)?;
        debug!(post_id, %username, %action, "like toggled");
        Ok((action, likes))
    }
}

fn storage(e: RepositoryError) -> PostError {
    PostError::StorageError(e.to_string())
}
