//! User model
//!
//! Defines the User entity for the Chirp service. The email address doubles
//! as the login handle and the display-name source: the part before the `@`
//! is the user's public handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
///
/// Follow relationships are stored separately as edges between user ids
/// (see the follow repository); a user never follows itself and follows
/// another user at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, used as login handle)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Profile bio
    pub bio: Option<String>,
    /// Avatar image reference
    pub avatar: Option<String>,
    /// Staff flag (admin-tooling concern, not used by the core)
    pub is_staff: bool,
    /// Superuser flag
    pub is_superuser: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this
    /// function. Use `services::password::hash_password()` to hash it.
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            password_hash,
            bio: None,
            avatar: None,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The user's display handle: the local part of the email address.
    ///
    /// `"alice@x.com"` yields `"alice"`. An email without an `@` (which
    /// signup rejects) falls back to the whole string.
    pub fn handle(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct SignupInput {
    /// Email address (unique)
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Profile bio (optional)
    pub bio: Option<String>,
    /// Avatar reference (optional)
    pub avatar: Option<String>,
}

impl SignupInput {
    /// Create a new signup input with just email and password
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            bio: None,
            avatar: None,
        }
    }
}

/// Input for a partial profile update
///
/// `None` fields are left untouched, mirroring PATCH semantics.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// New email (optional)
    pub email: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
    /// New bio (optional)
    pub bio: Option<String>,
    /// New avatar reference (optional)
    pub avatar: Option<String>,
}
