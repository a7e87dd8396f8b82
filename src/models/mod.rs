//! Data models
//!
//! This module contains all data structures used throughout the Chirp service.
//! Models represent:
//! - Database entities (User, Session, Tweet, Comment)
//! - Input structs for create/update operations

mod comment;
mod session;
mod tweet;
mod user;

pub use comment::{Comment, CommentWithAuthor};
pub use session::Session;
pub use tweet::Tweet;
pub use user::{SignupInput, UpdateProfileInput, User};
