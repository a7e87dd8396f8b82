//! API response shapes
//!
//! Serialization types shared across endpoints. `TweetResponse` is the one
//! contract every tweet read goes through: building it is a pure function of
//! a tweet, its author, and precomputed engagement, so handlers cannot
//! drift apart in what they return.

use serde::Serialize;

use crate::models::{CommentWithAuthor, Tweet, User};
use crate::services::engagement::Engagement;

/// A fully rendered tweet as returned by every tweet-reading endpoint.
///
/// `username` and `handle` both carry the local part of the author's email;
/// clients consume them in different places and the duplication is part of
/// the wire contract.
#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub id: i64,
    pub content: String,
    pub username: String,
    pub author_id: i64,
    pub timestamp: String,
    pub is_following: bool,
    pub likes_count: i64,
    pub liked_by_me: bool,
    pub replies_count: i64,
    pub retweets_count: i64,
    pub handle: String,
}

impl TweetResponse {
    /// Assemble a response from a tweet, its author, and engagement computed
    /// for the requesting viewer.
    pub fn from_parts(tweet: &Tweet, author: &User, engagement: &Engagement) -> Self {
        let handle = author.handle().to_string();
        Self {
            id: tweet.id,
            content: tweet.content.clone(),
            username: handle.clone(),
            author_id: author.id,
            timestamp: tweet.created_at.to_rfc3339(),
            is_following: engagement.is_following_author,
            likes_count: engagement.likes_count,
            liked_by_me: engagement.liked_by_viewer,
            replies_count: engagement.replies_count,
            retweets_count: engagement.retweets_count,
            handle,
        }
    }
}

/// Result of a follow toggle
#[derive(Debug, Serialize)]
pub struct FollowToggleResponse {
    /// "followed" or "unfollowed"
    pub status: &'static str,
    pub is_following: bool,
    pub followers_count: i64,
}

impl FollowToggleResponse {
    pub fn new(is_following: bool, followers_count: i64) -> Self {
        Self {
            status: if is_following { "followed" } else { "unfollowed" },
            is_following,
            followers_count,
        }
    }
}

/// Compact user entry in follower/following listings
#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: i64,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserListItem {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.handle().to_string(),
        }
    }
}

/// Followers and following of the requesting user
#[derive(Debug, Serialize)]
pub struct FollowersFollowingResponse {
    pub followers: Vec<UserListItem>,
    pub followers_count: usize,
    pub following: Vec<UserListItem>,
    pub following_count: usize,
}

/// One user search hit
///
/// `bio` is an empty string when the user never set one.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub bio: String,
    pub is_following: bool,
}

/// User search results
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

/// A rendered comment
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub tweet: i64,
    pub author: i64,
    pub author_email: String,
    pub content: String,
    pub created_at: String,
}

impl From<&CommentWithAuthor> for CommentResponse {
    fn from(comment: &CommentWithAuthor) -> Self {
        Self {
            id: comment.id,
            tweet: comment.tweet_id,
            author: comment.author_id,
            author_email: comment.author_email.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}
