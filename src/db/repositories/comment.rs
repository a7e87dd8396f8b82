//! Comment repository
//!
//! Database operations for comments on tweets. Listing joins the users table
//! so the API can render the author email without a second query.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// List comments on a tweet with author info, oldest first
    async fn list_for_tweet(&self, tweet_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Number of comments on a tweet
    async fn count_for_tweet(&self, tweet_id: i64) -> Result<i64>;
}

/// SQLx-based comment repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    /// Create a new SQLx comment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.as_sqlite().unwrap(), comment).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.as_mysql().unwrap(), comment).await
            }
        }
    }

    async fn list_for_tweet(&self, tweet_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_tweet_sqlite(self.pool.as_sqlite().unwrap(), tweet_id).await
            }
            DatabaseDriver::Mysql => {
                list_for_tweet_mysql(self.pool.as_mysql().unwrap(), tweet_id).await
            }
        }
    }

    async fn count_for_tweet(&self, tweet_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_for_tweet_sqlite(self.pool.as_sqlite().unwrap(), tweet_id).await
            }
            DatabaseDriver::Mysql => {
                count_for_tweet_mysql(self.pool.as_mysql().unwrap(), tweet_id).await
            }
        }
    }
}

const LIST_COMMENTS_SQL: &str = r#"
    SELECT c.id, c.tweet_id, c.author_id, u.email AS author_email, c.content, c.created_at
    FROM comments c
    INNER JOIN users u ON u.id = c.author_id
    WHERE c.tweet_id = ?
    ORDER BY c.created_at ASC, c.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO comments (tweet_id, author_id, content, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(comment.tweet_id)
    .bind(comment.author_id)
    .bind(&comment.content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        tweet_id: comment.tweet_id,
        author_id: comment.author_id,
        content: comment.content.clone(),
        created_at: now,
    })
}

async fn list_for_tweet_sqlite(pool: &SqlitePool, tweet_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_COMMENTS_SQL)
        .bind(tweet_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(CommentWithAuthor {
            id: row.get("id"),
            tweet_id: row.get("tweet_id"),
            author_id: row.get("author_id"),
            author_email: row.get("author_email"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        });
    }

    Ok(comments)
}

async fn count_for_tweet_sqlite(pool: &SqlitePool, tweet_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE tweet_id = ?")
        .bind(tweet_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    Ok(row.get("count"))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO comments (tweet_id, author_id, content, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(comment.tweet_id)
    .bind(comment.author_id)
    .bind(&comment.content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        tweet_id: comment.tweet_id,
        author_id: comment.author_id,
        content: comment.content.clone(),
        created_at: now,
    })
}

async fn list_for_tweet_mysql(pool: &MySqlPool, tweet_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_COMMENTS_SQL)
        .bind(tweet_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(CommentWithAuthor {
            id: row.get("id"),
            tweet_id: row.get("tweet_id"),
            author_id: row.get("author_id"),
            author_email: row.get("author_email"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        });
    }

    Ok(comments)
}

async fn count_for_tweet_mysql(pool: &MySqlPool, tweet_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE tweet_id = ?")
        .bind(tweet_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    Ok(row.get("count"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::tweet::{SqlxTweetRepository, TweetRepository};
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Tweet, User};

    async fn setup() -> (SqlxCommentRepository, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("author@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        let tweets = SqlxTweetRepository::new(pool.clone());
        let tweet = tweets
            .create(&Tweet::new(author.id, "hello".to_string()))
            .await
            .expect("Failed to create tweet");

        (SqlxCommentRepository::new(pool), author.id, tweet.id)
    }

    #[tokio::test]
    async fn test_create_comment() {
        let (repo, author, tweet) = setup().await;

        let created = repo
            .create(&Comment::new(tweet, author, "nice one".to_string()))
            .await
            .expect("Failed to create comment");

        assert!(created.id > 0);
        assert_eq!(created.tweet_id, tweet);
        assert_eq!(created.author_id, author);
    }

    #[tokio::test]
    async fn test_list_for_tweet_oldest_first_with_author() {
        let (repo, author, tweet) = setup().await;

        repo.create(&Comment::new(tweet, author, "first".to_string()))
            .await
            .expect("Failed to create comment");
        repo.create(&Comment::new(tweet, author, "second".to_string()))
            .await
            .expect("Failed to create comment");

        let comments = repo.list_for_tweet(tweet).await.expect("Failed to list");

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");
        assert_eq!(comments[1].content, "second");
        assert_eq!(comments[0].author_email, "author@example.com");
    }

    #[tokio::test]
    async fn test_list_for_missing_tweet_is_empty() {
        let (repo, _author, _tweet) = setup().await;

        let comments = repo.list_for_tweet(999).await.expect("Failed to list");

        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_count_for_tweet() {
        let (repo, author, tweet) = setup().await;

        assert_eq!(repo.count_for_tweet(tweet).await.expect("Failed to count"), 0);

        repo.create(&Comment::new(tweet, author, "one".to_string()))
            .await
            .expect("Failed to create comment");

        assert_eq!(repo.count_for_tweet(tweet).await.expect("Failed to count"), 1);
    }
}
