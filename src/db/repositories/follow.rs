//! Follow repository
//!
//! Database operations for the follow graph. The `follows` table is an edge
//! table with a composite primary key, so the relation is a set: a pair of
//! users is either connected or not, never connected twice.
//!
//! `toggle` runs inside a transaction so the membership check and the
//! insert/delete are a single atomic step. Two racing toggles serialize at
//! the database; the composite primary key rejects any duplicate edge that
//! would otherwise slip through.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::db::repositories::user::{row_to_user_mysql, row_to_user_sqlite};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Follow repository trait
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Atomically flip the follow edge from `follower_id` to `followee_id`.
    /// Returns `true` if the edge exists after the call (now following),
    /// `false` if it does not (now unfollowed).
    async fn toggle(&self, follower_id: i64, followee_id: i64) -> Result<bool>;

    /// Check whether `follower_id` follows `followee_id`
    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool>;

    /// Users who follow `user_id`
    async fn followers_of(&self, user_id: i64) -> Result<Vec<User>>;

    /// Users whom `user_id` follows
    async fn following_of(&self, user_id: i64) -> Result<Vec<User>>;

    /// Number of followers of `user_id`
    async fn follower_count(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based follow repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxFollowRepository {
    pool: DynDatabasePool,
}

impl SqlxFollowRepository {
    /// Create a new SQLx follow repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FollowRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FollowRepository for SqlxFollowRepository {
    async fn toggle(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                toggle_sqlite(self.pool.as_sqlite().unwrap(), follower_id, followee_id).await
            }
            DatabaseDriver::Mysql => {
                toggle_mysql(self.pool.as_mysql().unwrap(), follower_id, followee_id).await
            }
        }
    }

    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                is_following_sqlite(self.pool.as_sqlite().unwrap(), follower_id, followee_id).await
            }
            DatabaseDriver::Mysql => {
                is_following_mysql(self.pool.as_mysql().unwrap(), follower_id, followee_id).await
            }
        }
    }

    async fn followers_of(&self, user_id: i64) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                followers_of_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                followers_of_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn following_of(&self, user_id: i64) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                following_of_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                following_of_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn follower_count(&self, user_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                follower_count_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                follower_count_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }
}

const FOLLOWERS_SQL: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.bio, u.avatar, u.is_staff, u.is_superuser,
           u.created_at, u.updated_at
    FROM users u
    INNER JOIN follows f ON f.follower_id = u.id
    WHERE f.followee_id = ?
    ORDER BY f.created_at DESC
"#;

const FOLLOWING_SQL: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.bio, u.avatar, u.is_staff, u.is_superuser,
           u.created_at, u.updated_at
    FROM users u
    INNER JOIN follows f ON f.followee_id = u.id
    WHERE f.follower_id = ?
    ORDER BY f.created_at DESC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn toggle_sqlite(pool: &SqlitePool, follower_id: i64, followee_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let existing = sqlx::query(
        "SELECT 1 AS present FROM follows WHERE follower_id = ? AND followee_id = ?",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to check follow edge")?;

    let now_following = if existing.is_some() {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete follow edge")?;
        false
    } else {
        sqlx::query(
            "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to insert follow edge")?;
        true
    };

    tx.commit().await.context("Failed to commit follow toggle")?;

    Ok(now_following)
}

async fn is_following_sqlite(
    pool: &SqlitePool,
    follower_id: i64,
    followee_id: i64,
) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS present FROM follows WHERE follower_id = ? AND followee_id = ?",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_optional(pool)
    .await
    .context("Failed to check follow edge")?;

    Ok(row.is_some())
}

async fn followers_of_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(FOLLOWERS_SQL)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list followers")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    Ok(users)
}

async fn following_of_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(FOLLOWING_SQL)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list following")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    Ok(users)
}

async fn follower_count_sqlite(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM follows WHERE followee_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count followers")?;

    Ok(row.get("count"))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn toggle_mysql(pool: &MySqlPool, follower_id: i64, followee_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let existing = sqlx::query(
        "SELECT 1 AS present FROM follows WHERE follower_id = ? AND followee_id = ?",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to check follow edge")?;

    let now_following = if existing.is_some() {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete follow edge")?;
        false
    } else {
        sqlx::query(
            "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to insert follow edge")?;
        true
    };

    tx.commit().await.context("Failed to commit follow toggle")?;

    Ok(now_following)
}

async fn is_following_mysql(
    pool: &MySqlPool,
    follower_id: i64,
    followee_id: i64,
) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS present FROM follows WHERE follower_id = ? AND followee_id = ?",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_optional(pool)
    .await
    .context("Failed to check follow edge")?;

    Ok(row.is_some())
}

async fn followers_of_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(FOLLOWERS_SQL)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list followers")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    Ok(users)
}

async fn following_of_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(FOLLOWING_SQL)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list following")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    Ok(users)
}

async fn follower_count_mysql(pool: &MySqlPool, user_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM follows WHERE followee_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count followers")?;

    Ok(row.get("count"))
}
