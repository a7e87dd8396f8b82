//! User service
//!
//! Business logic for accounts and authentication:
//! - Signup with email validation and uniqueness check
//! - Login/logout over opaque session tokens
//! - Session validation for the auth middleware
//! - Profile reads and partial updates
//!
//! Duplicate emails are reported as a validation error rather than a
//! distinct conflict: the client sees the same shape for "email taken"
//! as for "email malformed".

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, SignupInput, UpdateProfileInput, User};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input, including duplicate email)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Session expired
    #[error("Session expired")]
    SessionExpired,

    /// Session not found
    #[error("Session not found")]
    SessionNotFound,

    /// User not found
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the email is malformed, the password is empty,
    ///   or the email is already registered
    /// - `InternalError` for database errors
    pub async fn signup(&self, input: SignupInput) -> Result<User, UserServiceError> {
        let email = input.email.trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "A valid email address is required".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = hash(&input.password)?;

        let mut user = User::new(email, password_hash);
        user.bio = input.bio;
        user.avatar = input.avatar;

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, "User registered");

        Ok(created)
    }

    /// Login with email and password
    ///
    /// Returns the user and a fresh session on success.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if the email is unknown or the password is wrong
    /// - `InternalError` for database errors
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, Session), UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email.trim())
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid email or password".to_string())
            })?;

        let password_valid =
            crate::services::password::verify_password(password, &user.password_hash)
                .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok((user, session))
    }

    /// Logout (invalidate a session token)
    ///
    /// Deleting an unknown token is not an error; logout is idempotent.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate a session token and return the logged-in user
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the token is unknown
    /// - `SessionExpired` if the token has expired (the session is removed)
    pub async fn validate_session(&self, session_id: &str) -> Result<User, UserServiceError> {
        let session = self
            .session_repo
            .get_by_id(session_id)
            .await
            .context("Failed to get session")?
            .ok_or(UserServiceError::SessionNotFound)?;

        if session.is_expired() {
            // Expired sessions are garbage, drop them on sight
            self.session_repo
                .delete(session_id)
                .await
                .context("Failed to delete expired session")?;
            return Err(UserServiceError::SessionExpired);
        }

        self.user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user for session")?
            .ok_or(UserServiceError::SessionNotFound)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)
    }

    /// Partially update a user's profile
    ///
    /// Only the fields present in the input change; everything else is left
    /// as stored. A new password is re-hashed before persisting.
    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get_by_id(user_id).await?;

        if let Some(email) = input.email {
            let email = email.trim().to_string();
            if email.is_empty() || !email.contains('@') {
                return Err(UserServiceError::ValidationError(
                    "A valid email address is required".to_string(),
                ));
            }
            if email != user.email {
                if self
                    .user_repo
                    .get_by_email(&email)
                    .await
                    .context("Failed to check email")?
                    .is_some()
                {
                    return Err(UserServiceError::ValidationError(format!(
                        "Email '{}' is already registered",
                        email
                    )));
                }
                user.email = email;
            }
        }

        if let Some(password) = input.password {
            if password.is_empty() {
                return Err(UserServiceError::ValidationError(
                    "Password cannot be empty".to_string(),
                ));
            }
            user.password_hash = hash(&password)?;
        }

        if let Some(bio) = input.bio {
            user.bio = Some(bio);
        }

        if let Some(avatar) = input.avatar {
            user.avatar = Some(avatar);
        }

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        Ok(updated)
    }

    /// Delete a user account
    ///
    /// Sessions, tweets, comments, likes, and follow edges referencing the
    /// user go with it via the schema's cascades.
    pub async fn delete(&self, user_id: i64) -> Result<(), UserServiceError> {
        // Confirm the user exists so callers get a clean not-found
        self.get_by_id(user_id).await?;

        self.user_repo
            .delete(user_id)
            .await
            .context("Failed to delete user")?;

        tracing::info!(user_id, "User deleted");

        Ok(())
    }

    /// Ensure an admin account exists for the given credentials.
    ///
    /// Used at startup when admin bootstrap is configured. If the email is
    /// already registered this is a no-op.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check admin email")?
            .is_some()
        {
            return Ok(());
        }

        let password_hash = hash(password)?;
        let mut admin = User::new(email.to_string(), password_hash);
        admin.is_staff = true;
        admin.is_superuser = true;

        self.user_repo
            .create(&admin)
            .await
            .context("Failed to create admin user")?;

        tracing::info!(email, "Bootstrapped admin account");

        Ok(())
    }

    /// Create a new session for a user
    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

fn hash(password: &str) -> Result<String, UserServiceError> {
    crate::services::password::hash_password(password)
        .context("Failed to hash password")
        .map_err(UserServiceError::InternalError)
}
