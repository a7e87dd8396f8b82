//! Tweet model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tweet entity.
///
/// Author and creation timestamp are immutable once persisted; the only
/// mutable aspect of a tweet is its like-set membership, which lives in the
/// `tweet_likes` edge table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    /// Unique identifier
    pub id: i64,
    /// Authoring user ID
    pub author_id: i64,
    /// Tweet text
    pub content: String,
    /// Creation timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

impl Tweet {
    /// Create a new Tweet for the given author
    pub fn new(author_id: i64, content: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}
