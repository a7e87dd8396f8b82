//! Engagement service
//!
//! Computes the per-tweet counters and viewer-relative flags the API
//! attaches to every rendered tweet. Counts are always derived from the
//! edge tables at read time; nothing is cached or denormalized, so a
//! rendered tweet can never disagree with the stored edges.
//!
//! Retweets are not implemented; the count is carried as a constant zero
//! to keep the response shape stable for clients.

use crate::db::repositories::{CommentRepository, FollowRepository, TweetRepository};
use crate::models::Tweet;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Per-tweet engagement as seen by one viewer
#[derive(Debug, Clone, Copy, Default)]
pub struct Engagement {
    /// Total likes on the tweet
    pub likes_count: i64,
    /// Whether the viewer has liked the tweet
    pub liked_by_viewer: bool,
    /// Number of comments on the tweet
    pub replies_count: i64,
    /// Whether the viewer follows the tweet's author
    pub is_following_author: bool,
    /// Always zero; kept for response-shape stability
    pub retweets_count: i64,
}

/// Engagement service computing viewer-relative tweet state
pub struct EngagementService {
    tweet_repo: Arc<dyn TweetRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    follow_repo: Arc<dyn FollowRepository>,
}

impl EngagementService {
    /// Create a new engagement service with the given repositories
    pub fn new(
        tweet_repo: Arc<dyn TweetRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        follow_repo: Arc<dyn FollowRepository>,
    ) -> Self {
        Self {
            tweet_repo,
            comment_repo,
            follow_repo,
        }
    }

    /// Compute engagement for one tweet as seen by `viewer_id`.
    ///
    /// With no viewer (unauthenticated reads) the viewer-relative flags are
    /// false and the counts are still real.
    pub async fn compute(&self, tweet: &Tweet, viewer_id: Option<i64>) -> Result<Engagement> {
        let likes_count = self
            .tweet_repo
            .like_count(tweet.id)
            .await
            .context("Failed to count likes")?;

        let replies_count = self
            .comment_repo
            .count_for_tweet(tweet.id)
            .await
            .context("Failed to count replies")?;

        let (liked_by_viewer, is_following_author) = match viewer_id {
            Some(viewer) => {
                let liked = self
                    .tweet_repo
                    .is_liked_by(viewer, tweet.id)
                    .await
                    .context("Failed to check like")?;
                // A viewer never "follows" their own tweet's author
                let following = if viewer == tweet.author_id {
                    false
                } else {
                    self.follow_repo
                        .is_following(viewer, tweet.author_id)
                        .await
                        .context("Failed to check follow")?
                };
                (liked, following)
            }
            None => (false, false),
        };

        Ok(Engagement {
            likes_count,
            liked_by_viewer,
            replies_count,
            is_following_author,
            retweets_count: 0,
        })
    }
}
