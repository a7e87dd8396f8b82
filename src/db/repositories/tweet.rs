//! Tweet repository
//!
//! Database operations for tweets and the like relation. Likes live in the
//! `tweet_likes` edge table with a composite primary key, mirroring the
//! follow graph: a user either likes a tweet or does not.
//!
//! `toggle_like` uses the same transactional check-then-flip shape as the
//! follow toggle so concurrent requests settle to a consistent edge set.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Tweet;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tweet repository trait
#[async_trait]
pub trait TweetRepository: Send + Sync {
    /// Create a new tweet
    async fn create(&self, tweet: &Tweet) -> Result<Tweet>;

    /// Get tweet by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tweet>>;

    /// List all tweets, newest first
    async fn list(&self) -> Result<Vec<Tweet>>;

    /// Delete a tweet
    async fn delete(&self, id: i64) -> Result<()>;

    /// Atomically flip the like edge from `user_id` to `tweet_id`.
    /// Returns `true` if the tweet is liked after the call.
    async fn toggle_like(&self, user_id: i64, tweet_id: i64) -> Result<bool>;

    /// Number of likes on a tweet
    async fn like_count(&self, tweet_id: i64) -> Result<i64>;

    /// Whether `user_id` has liked `tweet_id`
    async fn is_liked_by(&self, user_id: i64, tweet_id: i64) -> Result<bool>;
}

/// SQLx-based tweet repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTweetRepository {
    pool: DynDatabasePool,
}

impl SqlxTweetRepository {
    /// Create a new SQLx tweet repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TweetRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TweetRepository for SqlxTweetRepository {
    async fn create(&self, tweet: &Tweet) -> Result<Tweet> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_tweet_sqlite(self.pool.as_sqlite().unwrap(), tweet).await
            }
            DatabaseDriver::Mysql => create_tweet_mysql(self.pool.as_mysql().unwrap(), tweet).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tweet>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_tweet_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_tweet_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Tweet>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_tweets_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_tweets_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_tweet_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_tweet_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn toggle_like(&self, user_id: i64, tweet_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                toggle_like_sqlite(self.pool.as_sqlite().unwrap(), user_id, tweet_id).await
            }
            DatabaseDriver::Mysql => {
                toggle_like_mysql(self.pool.as_mysql().unwrap(), user_id, tweet_id).await
            }
        }
    }

    async fn like_count(&self, tweet_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                like_count_sqlite(self.pool.as_sqlite().unwrap(), tweet_id).await
            }
            DatabaseDriver::Mysql => like_count_mysql(self.pool.as_mysql().unwrap(), tweet_id).await,
        }
    }

    async fn is_liked_by(&self, user_id: i64, tweet_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                is_liked_by_sqlite(self.pool.as_sqlite().unwrap(), user_id, tweet_id).await
            }
            DatabaseDriver::Mysql => {
                is_liked_by_mysql(self.pool.as_mysql().unwrap(), user_id, tweet_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tweet_sqlite(pool: &SqlitePool, tweet: &Tweet) -> Result<Tweet> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tweets (author_id, content, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(tweet.author_id)
    .bind(&tweet.content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create tweet")?;

    Ok(Tweet {
        id: result.last_insert_rowid(),
        author_id: tweet.author_id,
        content: tweet.content.clone(),
        created_at: now,
    })
}

async fn get_tweet_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tweet>> {
    let row = sqlx::query("SELECT id, author_id, content, created_at FROM tweets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tweet by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_tweet_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_tweets_sqlite(pool: &SqlitePool) -> Result<Vec<Tweet>> {
    // Id breaks ties between tweets created in the same timestamp tick
    let rows = sqlx::query(
        r#"
        SELECT id, author_id, content, created_at
        FROM tweets
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tweets")?;

    let mut tweets = Vec::new();
    for row in rows {
        tweets.push(row_to_tweet_sqlite(&row)?);
    }

    Ok(tweets)
}

async fn delete_tweet_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tweets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tweet")?;

    Ok(())
}

async fn toggle_like_sqlite(pool: &SqlitePool, user_id: i64, tweet_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let existing = sqlx::query(
        "SELECT 1 AS present FROM tweet_likes WHERE user_id = ? AND tweet_id = ?",
    )
    .bind(user_id)
    .bind(tweet_id)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to check like edge")?;

    let now_liked = if existing.is_some() {
        sqlx::query("DELETE FROM tweet_likes WHERE user_id = ? AND tweet_id = ?")
            .bind(user_id)
            .bind(tweet_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete like edge")?;
        false
    } else {
        sqlx::query("INSERT INTO tweet_likes (user_id, tweet_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(tweet_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .context("Failed to insert like edge")?;
        true
    };

    tx.commit().await.context("Failed to commit like toggle")?;

    Ok(now_liked)
}

async fn like_count_sqlite(pool: &SqlitePool, tweet_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM tweet_likes WHERE tweet_id = ?")
        .bind(tweet_id)
        .fetch_one(pool)
        .await
        .context("Failed to count likes")?;

    Ok(row.get("count"))
}

async fn is_liked_by_sqlite(pool: &SqlitePool, user_id: i64, tweet_id: i64) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS present FROM tweet_likes WHERE user_id = ? AND tweet_id = ?",
    )
    .bind(user_id)
    .bind(tweet_id)
    .fetch_optional(pool)
    .await
    .context("Failed to check like edge")?;

    Ok(row.is_some())
}

fn row_to_tweet_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tweet> {
    Ok(Tweet {
        id: row.get("id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tweet_mysql(pool: &MySqlPool, tweet: &Tweet) -> Result<Tweet> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tweets (author_id, content, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(tweet.author_id)
    .bind(&tweet.content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create tweet")?;

    Ok(Tweet {
        id: result.last_insert_id() as i64,
        author_id: tweet.author_id,
        content: tweet.content.clone(),
        created_at: now,
    })
}

async fn get_tweet_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tweet>> {
    let row = sqlx::query("SELECT id, author_id, content, created_at FROM tweets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tweet by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_tweet_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_tweets_mysql(pool: &MySqlPool) -> Result<Vec<Tweet>> {
    let rows = sqlx::query(
        r#"
        SELECT id, author_id, content, created_at
        FROM tweets
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tweets")?;

    let mut tweets = Vec::new();
    for row in rows {
        tweets.push(row_to_tweet_mysql(&row)?);
    }

    Ok(tweets)
}

async fn delete_tweet_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tweets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tweet")?;

    Ok(())
}

async fn toggle_like_mysql(pool: &MySqlPool, user_id: i64, tweet_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let existing = sqlx::query(
        "SELECT 1 AS present FROM tweet_likes WHERE user_id = ? AND tweet_id = ?",
    )
    .bind(user_id)
    .bind(tweet_id)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to check like edge")?;

    let now_liked = if existing.is_some() {
        sqlx::query("DELETE FROM tweet_likes WHERE user_id = ? AND tweet_id = ?")
            .bind(user_id)
            .bind(tweet_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete like edge")?;
        false
    } else {
        sqlx::query("INSERT INTO tweet_likes (user_id, tweet_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(tweet_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .context("Failed to insert like edge")?;
        true
    };

    tx.commit().await.context("Failed to commit like toggle")?;

    Ok(now_liked)
}

async fn like_count_mysql(pool: &MySqlPool, tweet_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM tweet_likes WHERE tweet_id = ?")
        .bind(tweet_id)
        .fetch_one(pool)
        .await
        .context("Failed to count likes")?;

    Ok(row.get("count"))
}

async fn is_liked_by_mysql(pool: &MySqlPool, user_id: i64, tweet_id: i64) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 AS present FROM tweet_likes WHERE user_id = ? AND tweet_id = ?",
    )
    .bind(user_id)
    .bind(tweet_id)
    .fetch_optional(pool)
    .await
    .context("Failed to check like edge")?;

    Ok(row.is_some())
}

fn row_to_tweet_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Tweet> {
    Ok(Tweet {
        id: row.get("id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlxTweetRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("author@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        (SqlxTweetRepository::new(pool), author.id)
    }

    #[tokio::test]
    async fn test_create_and_get_tweet() {
        let (repo, author) = setup().await;

        let created = repo
            .create(&Tweet::new(author, "first!".to_string()))
            .await
            .expect("Failed to create tweet");

        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get tweet")
            .expect("Tweet not found");

        assert_eq!(found.content, "first!");
        assert_eq!(found.author_id, author);
    }

    #[tokio::test]
    async fn test_get_tweet_not_found() {
        let (repo, _author) = setup().await;

        let found = repo.get_by_id(999).await.expect("Failed to get tweet");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (repo, author) = setup().await;

        let first = repo
            .create(&Tweet::new(author, "older".to_string()))
            .await
            .expect("Failed to create tweet");
        let second = repo
            .create(&Tweet::new(author, "newer".to_string()))
            .await
            .expect("Failed to create tweet");

        let tweets = repo.list().await.expect("Failed to list tweets");

        assert_eq!(tweets.len(), 2);
        assert_eq!(tweets[0].id, second.id);
        assert_eq!(tweets[1].id, first.id);
    }

    #[tokio::test]
    async fn test_delete_tweet() {
        let (repo, author) = setup().await;
        let created = repo
            .create(&Tweet::new(author, "ephemeral".to_string()))
            .await
            .expect("Failed to create tweet");

        repo.delete(created.id).await.expect("Failed to delete tweet");

        let found = repo.get_by_id(created.id).await.expect("Failed to get tweet");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_toggle_like_flips_state() {
        let (repo, author) = setup().await;
        let tweet = repo
            .create(&Tweet::new(author, "likeable".to_string()))
            .await
            .expect("Failed to create tweet");

        let liked = repo.toggle_like(author, tweet.id).await.expect("Failed to toggle");
        assert!(liked);
        assert!(repo.is_liked_by(author, tweet.id).await.expect("Failed to check"));
        assert_eq!(repo.like_count(tweet.id).await.expect("Failed to count"), 1);

        let liked = repo.toggle_like(author, tweet.id).await.expect("Failed to toggle");
        assert!(!liked);
        assert!(!repo.is_liked_by(author, tweet.id).await.expect("Failed to check"));
        assert_eq!(repo.like_count(tweet.id).await.expect("Failed to count"), 0);
    }

    #[tokio::test]
    async fn test_like_count_never_negative() {
        let (repo, author) = setup().await;
        let tweet = repo
            .create(&Tweet::new(author, "popular".to_string()))
            .await
            .expect("Failed to create tweet");

        for _ in 0..5 {
            repo.toggle_like(author, tweet.id).await.expect("Failed to toggle");
            let count = repo.like_count(tweet.id).await.expect("Failed to count");
            assert!(count >= 0);
            assert!(count <= 1);
        }
    }

    #[tokio::test]
    async fn test_delete_tweet_removes_likes() {
        let (repo, author) = setup().await;
        let tweet = repo
            .create(&Tweet::new(author, "soon gone".to_string()))
            .await
            .expect("Failed to create tweet");
        repo.toggle_like(author, tweet.id).await.expect("Failed to toggle");

        repo.delete(tweet.id).await.expect("Failed to delete tweet");

        assert_eq!(repo.like_count(tweet.id).await.expect("Failed to count"), 0);
    }
}
