//! Services layer - Business logic
//!
//! This module contains all business logic services for the Chirp backend.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod engagement;
pub mod password;
pub mod social;
pub mod tweet;
pub mod user;

pub use engagement::{Engagement, EngagementService};
pub use password::{hash_password, verify_password};
pub use social::{FollowLists, FollowState, SearchHit, SocialService, SocialServiceError};
pub use tweet::{LikeState, TweetService, TweetServiceError, MAX_CONTENT_CHARS};
pub use user::{UserService, UserServiceError};
