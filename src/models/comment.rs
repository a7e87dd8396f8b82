//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity.
///
/// Belongs to exactly one tweet and one author; neither reference changes
/// after creation. Comments are deleted with their parent tweet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Parent tweet ID (immutable)
    pub tweet_id: i64,
    /// Authoring user ID (immutable, always the authenticated caller)
    pub author_id: i64,
    /// Comment text
    pub content: String,
    /// Creation timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new Comment on the given tweet
    pub fn new(tweet_id: i64, author_id: i64, content: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            tweet_id,
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Comment joined with its author's email, as listed under a tweet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    /// Unique identifier
    pub id: i64,
    /// Parent tweet ID
    pub tweet_id: i64,
    /// Authoring user ID
    pub author_id: i64,
    /// Author's email address
    pub author_email: String,
    /// Comment text
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
