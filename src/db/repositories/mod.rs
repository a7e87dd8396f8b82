//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod comment;
pub mod follow;
pub mod session;
pub mod tweet;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use follow::{FollowRepository, SqlxFollowRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use tweet::{SqlxTweetRepository, TweetRepository};
pub use user::{SqlxUserRepository, UserRepository};
