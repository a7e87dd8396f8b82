//! Session model
//!
//! A session is the server-side half of a bearer token: login creates one,
//! the auth middleware resolves the presented token back to a user, and
//! logout (or expiry) deletes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session token (uuid), also the primary key
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// Moment after which the session no longer authenticates
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the expiry moment has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
