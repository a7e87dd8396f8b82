//! Social graph service
//!
//! Business logic for the follow graph and user discovery:
//! - Follow toggle with self-follow and missing-target checks
//! - Follower/following listings with counts
//! - Email substring search over other users
//!
//! The toggle itself is atomic at the repository layer; this service owns
//! the precondition checks and the shape of the results.

use crate::db::repositories::{FollowRepository, UserRepository};
use crate::models::User;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Hard cap on user search results
const SEARCH_RESULT_LIMIT: i64 = 10;

/// Error types for social service operations
#[derive(Debug, thiserror::Error)]
pub enum SocialServiceError {
    /// A user tried to follow themselves
    #[error("Users cannot follow themselves")]
    SelfFollow,

    /// Target user does not exist
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Follow state after a toggle, as seen by the acting user
#[derive(Debug, Clone, Copy)]
pub struct FollowState {
    /// Whether the actor now follows the target
    pub is_following: bool,
    /// Target's follower count after the toggle
    pub followers_count: i64,
}

/// A search hit with follow state relative to the searcher
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched user
    pub user: User,
    /// Whether the searcher follows this user
    pub is_following: bool,
}

/// Followers and following of one user, with counts
#[derive(Debug, Clone)]
pub struct FollowLists {
    pub followers: Vec<User>,
    pub following: Vec<User>,
}

/// Social service for the follow graph
pub struct SocialService {
    user_repo: Arc<dyn UserRepository>,
    follow_repo: Arc<dyn FollowRepository>,
}

impl SocialService {
    /// Create a new social service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, follow_repo: Arc<dyn FollowRepository>) -> Self {
        Self {
            user_repo,
            follow_repo,
        }
    }

    /// Toggle the follow edge from `actor_id` to `target_id`.
    ///
    /// # Errors
    ///
    /// - `SelfFollow` if actor and target are the same user
    /// - `NotFound` if the target does not exist
    /// - `InternalError` for database errors
    pub async fn toggle_follow(
        &self,
        actor_id: i64,
        target_id: i64,
    ) -> Result<FollowState, SocialServiceError> {
        // Existence first: following a missing user is not-found even
        // when it is also a self-follow of a deleted account
        if self
            .user_repo
            .get_by_id(target_id)
            .await
            .context("Failed to look up target user")?
            .is_none()
        {
            return Err(SocialServiceError::NotFound);
        }

        if actor_id == target_id {
            return Err(SocialServiceError::SelfFollow);
        }

        let is_following = self
            .follow_repo
            .toggle(actor_id, target_id)
            .await
            .context("Failed to toggle follow")?;

        let followers_count = self
            .follow_repo
            .follower_count(target_id)
            .await
            .context("Failed to count followers")?;

        tracing::debug!(actor_id, target_id, is_following, "Follow toggled");

        Ok(FollowState {
            is_following,
            followers_count,
        })
    }

    /// Whether `actor_id` follows `target_id`
    pub async fn is_following(
        &self,
        actor_id: i64,
        target_id: i64,
    ) -> Result<bool, SocialServiceError> {
        Ok(self
            .follow_repo
            .is_following(actor_id, target_id)
            .await
            .context("Failed to check follow")?)
    }

    /// Followers and following of a user
    pub async fn followers_following(
        &self,
        user_id: i64,
    ) -> Result<FollowLists, SocialServiceError> {
        let followers = self
            .follow_repo
            .followers_of(user_id)
            .await
            .context("Failed to list followers")?;
        let following = self
            .follow_repo
            .following_of(user_id)
            .await
            .context("Failed to list following")?;

        Ok(FollowLists {
            followers,
            following,
        })
    }

    /// Search users by case-insensitive email substring.
    ///
    /// The actor never appears in their own results. A blank query returns
    /// no hits rather than everyone. Results are capped at ten.
    pub async fn search_users(
        &self,
        actor_id: i64,
        query: &str,
    ) -> Result<Vec<SearchHit>, SocialServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let users = self
            .user_repo
            .search_by_email(query, actor_id, SEARCH_RESULT_LIMIT)
            .await
            .context("Failed to search users")?;

        let mut hits = Vec::with_capacity(users.len());
        for user in users {
            let is_following = self
                .follow_repo
                .is_following(actor_id, user.id)
                .await
                .context("Failed to check follow for search hit")?;
            hits.push(SearchHit { user, is_following });
        }

        Ok(hits)
    }
}
