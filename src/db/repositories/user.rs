//! User repository
//!
//! Database operations for user accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// Case-insensitive email substring search, excluding one user.
    /// Results are ordered by email and capped at `limit`.
    async fn search_by_email(&self, query: &str, exclude_id: i64, limit: i64) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_user_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_users_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn search_by_email(&self, query: &str, exclude_id: i64, limit: i64) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                search_by_email_sqlite(self.pool.as_sqlite().unwrap(), query, exclude_id, limit)
                    .await
            }
            DatabaseDriver::Mysql => {
                search_by_email_mysql(self.pool.as_mysql().unwrap(), query, exclude_id, limit).await
            }
        }
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, bio, avatar, is_staff, is_superuser, created_at, updated_at";

/// Escape LIKE metacharacters so the query matches them literally
fn escape_like_pattern(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, bio, avatar, is_staff, is_superuser, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&user.avatar)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        bio: user.bio.clone(),
        avatar: user.avatar.clone(),
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET email = ?, password_hash = ?, bio = ?, avatar = ?, is_staff = ?, is_superuser = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&user.avatar)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    // Return the updated user
    get_user_by_id_sqlite(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

async fn search_by_email_sqlite(
    pool: &SqlitePool,
    query: &str,
    exclude_id: i64,
    limit: i64,
) -> Result<Vec<User>> {
    let pattern = format!("%{}%", escape_like_pattern(&query.to_lowercase()));

    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM users
        WHERE LOWER(email) LIKE ? ESCAPE '\' AND id <> ?
        ORDER BY email
        LIMIT ?
        "#,
        USER_COLUMNS
    ))
    .bind(&pattern)
    .bind(exclude_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to search users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    Ok(users)
}

pub(crate) fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        bio: row.get("bio"),
        avatar: row.get("avatar"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, bio, avatar, is_staff, is_superuser, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&user.avatar)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    Ok(User {
        id,
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        bio: user.bio.clone(),
        avatar: user.avatar.clone(),
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET email = ?, password_hash = ?, bio = ?, avatar = ?, is_staff = ?, is_superuser = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&user.avatar)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    // Return the updated user
    get_user_by_id_mysql(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

async fn search_by_email_mysql(
    pool: &MySqlPool,
    query: &str,
    exclude_id: i64,
    limit: i64,
) -> Result<Vec<User>> {
    let pattern = format!("%{}%", escape_like_pattern(&query.to_lowercase()));

    // MySQL's string parser consumes one level of backslash escaping
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM users
        WHERE LOWER(email) LIKE ? ESCAPE '\\' AND id <> ?
        ORDER BY email
        LIMIT ?
        "#,
        USER_COLUMNS
    ))
    .bind(&pattern)
    .bind(exclude_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to search users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    Ok(users)
}

pub(crate) fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        bio: row.get("bio"),
        avatar: row.get("avatar"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(email: &str) -> User {
        User::new(
            email.to_string(),
            hash_password("test_password").expect("Failed to hash password"),
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("test@example.com");

        let created = repo.create(&user).await.expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.email, "test@example.com");
        assert!(!created.is_staff);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("test@example.com");
        let created = repo.create(&user).await.expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("unique@example.com");
        repo.create(&user).await.expect("Failed to create user");

        let found = repo
            .get_by_email("unique@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.email, "unique@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("dup@example.com"))
            .await
            .expect("Failed to create user");

        let result = repo.create(&create_test_user("dup@example.com")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("before@example.com");
        let mut created = repo.create(&user).await.expect("Failed to create user");

        created.bio = Some("Hello, I tweet.".to_string());
        created.avatar = Some("https://cdn.example.com/a.png".to_string());
        let updated = repo.update(&created).await.expect("Failed to update user");

        assert_eq!(updated.bio.as_deref(), Some("Hello, I tweet."));
        assert_eq!(updated.avatar.as_deref(), Some("https://cdn.example.com/a.png"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&create_test_user("gone@example.com"))
            .await
            .expect("Failed to create user");

        repo.delete(created.id).await.expect("Failed to delete user");

        let found = repo.get_by_id(created.id).await.expect("Failed to get user");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_count_users() {
        let (_pool, repo) = setup_test_repo().await;
        assert_eq!(repo.count().await.expect("Failed to count"), 0);

        repo.create(&create_test_user("one@example.com"))
            .await
            .expect("Failed to create user");
        repo.create(&create_test_user("two@example.com"))
            .await
            .expect("Failed to create user");

        assert_eq!(repo.count().await.expect("Failed to count"), 2);
    }

    #[tokio::test]
    async fn test_search_by_email_substring() {
        let (_pool, repo) = setup_test_repo().await;
        let actor = repo
            .create(&create_test_user("alice@example.com"))
            .await
            .expect("Failed to create user");
        repo.create(&create_test_user("alicia@example.com"))
            .await
            .expect("Failed to create user");
        repo.create(&create_test_user("bob@example.com"))
            .await
            .expect("Failed to create user");

        let results = repo
            .search_by_email("ali", actor.id, 10)
            .await
            .expect("Failed to search");

        // alice matches "ali" too, but is excluded as the actor
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].email, "alicia@example.com");
    }

    #[tokio::test]
    async fn test_search_by_email_case_insensitive() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("Carol@Example.com"))
            .await
            .expect("Failed to create user");

        let results = repo
            .search_by_email("carol", 0, 10)
            .await
            .expect("Failed to search");

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_by_email_respects_limit() {
        let (_pool, repo) = setup_test_repo().await;
        for i in 0..15 {
            repo.create(&create_test_user(&format!("user{:02}@example.com", i)))
                .await
                .expect("Failed to create user");
        }

        let results = repo
            .search_by_email("user", 0, 10)
            .await
            .expect("Failed to search");

        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("dana@example.com"))
            .await
            .expect("Failed to create user");
        repo.create(&create_test_user("erin@example.com"))
            .await
            .expect("Failed to create user");
        repo.create(&create_test_user("odd_one@example.com"))
            .await
            .expect("Failed to create user");

        // No email contains a literal '%'
        let results = repo
            .search_by_email("%", 0, 10)
            .await
            .expect("Failed to search");
        assert!(results.is_empty());

        // '_' must not act as a single-character wildcard ("e_in" would
        // otherwise match "erin")
        let results = repo
            .search_by_email("e_in", 0, 10)
            .await
            .expect("Failed to search");
        assert!(results.is_empty());

        let results = repo
            .search_by_email("odd_", 0, 10)
            .await
            .expect("Failed to search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].email, "odd_one@example.com");
    }

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like_pattern("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }
}
