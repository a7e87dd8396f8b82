//! Tweet service
//!
//! Business logic for tweets, comments, and likes:
//! - Content validation (non-blank after trimming, at most 280 characters)
//! - Author assignment from the authenticated user, never from the payload
//! - Like toggle over an existing tweet
//! - Author-only deletion

use crate::db::repositories::{CommentRepository, TweetRepository};
use crate::models::{Comment, CommentWithAuthor, Tweet};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Maximum content length for tweets and comments, in characters
pub const MAX_CONTENT_CHARS: usize = 280;

/// Error types for tweet service operations
#[derive(Debug, thiserror::Error)]
pub enum TweetServiceError {
    /// Content failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Tweet not found
    #[error("Tweet not found")]
    NotFound,

    /// Acting user is not allowed to perform this operation
    #[error("Only the author may do that")]
    Forbidden,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Like state after a toggle
#[derive(Debug, Clone, Copy)]
pub struct LikeState {
    /// Whether the actor now likes the tweet
    pub liked: bool,
    /// The tweet's like count after the toggle
    pub likes_count: i64,
}

/// Tweet service for posts, comments, and likes
pub struct TweetService {
    tweet_repo: Arc<dyn TweetRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl TweetService {
    /// Create a new tweet service with the given repositories
    pub fn new(
        tweet_repo: Arc<dyn TweetRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            tweet_repo,
            comment_repo,
        }
    }

    /// Create a tweet authored by `author_id`
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the content is blank or over the length cap
    /// - `InternalError` for database errors
    pub async fn create_tweet(
        &self,
        author_id: i64,
        content: &str,
    ) -> Result<Tweet, TweetServiceError> {
        let content = validate_content(content)?;

        let tweet = self
            .tweet_repo
            .create(&Tweet::new(author_id, content))
            .await
            .context("Failed to create tweet")?;

        tracing::debug!(tweet_id = tweet.id, author_id, "Tweet created");

        Ok(tweet)
    }

    /// Get a tweet by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Tweet, TweetServiceError> {
        self.tweet_repo
            .get_by_id(id)
            .await
            .context("Failed to get tweet")?
            .ok_or(TweetServiceError::NotFound)
    }

    /// List all tweets, newest first
    pub async fn list(&self) -> Result<Vec<Tweet>, TweetServiceError> {
        Ok(self.tweet_repo.list().await.context("Failed to list tweets")?)
    }

    /// Delete a tweet. Only its author may delete it.
    pub async fn delete(&self, actor_id: i64, tweet_id: i64) -> Result<(), TweetServiceError> {
        let tweet = self.get_by_id(tweet_id).await?;

        if tweet.author_id != actor_id {
            return Err(TweetServiceError::Forbidden);
        }

        self.tweet_repo
            .delete(tweet_id)
            .await
            .context("Failed to delete tweet")?;

        tracing::debug!(tweet_id, actor_id, "Tweet deleted");

        Ok(())
    }

    /// Toggle the actor's like on a tweet
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tweet does not exist
    /// - `InternalError` for database errors
    pub async fn toggle_like(
        &self,
        actor_id: i64,
        tweet_id: i64,
    ) -> Result<LikeState, TweetServiceError> {
        // Liking a missing tweet is not-found, not a silent no-op
        self.get_by_id(tweet_id).await?;

        let liked = self
            .tweet_repo
            .toggle_like(actor_id, tweet_id)
            .await
            .context("Failed to toggle like")?;

        let likes_count = self
            .tweet_repo
            .like_count(tweet_id)
            .await
            .context("Failed to count likes")?;

        Ok(LikeState { liked, likes_count })
    }

    /// Comment on a tweet as `author_id`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tweet does not exist
    /// - `ValidationError` if the content is blank or over the length cap
    pub async fn create_comment(
        &self,
        author_id: i64,
        tweet_id: i64,
        content: &str,
    ) -> Result<Comment, TweetServiceError> {
        self.get_by_id(tweet_id).await?;

        let content = validate_content(content)?;

        let comment = self
            .comment_repo
            .create(&Comment::new(tweet_id, author_id, content))
            .await
            .context("Failed to create comment")?;

        Ok(comment)
    }

    /// List comments on a tweet, oldest first
    pub async fn list_comments(
        &self,
        tweet_id: i64,
    ) -> Result<Vec<CommentWithAuthor>, TweetServiceError> {
        self.get_by_id(tweet_id).await?;

        Ok(self
            .comment_repo
            .list_for_tweet(tweet_id)
            .await
            .context("Failed to list comments")?)
    }
}

/// Trim content and enforce the length bound shared by tweets and comments
fn validate_content(content: &str) -> Result<String, TweetServiceError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(TweetServiceError::ValidationError(
            "Content cannot be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(TweetServiceError::ValidationError(format!(
            "Content cannot exceed {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    Ok(trimmed.to_string())
}
