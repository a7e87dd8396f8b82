//! Database layer
//!
//! This module provides database abstraction for the Chirp service.
//! It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The database driver is selected based on configuration. Access goes
//! through per-entity repositories (`repositories`), and schema setup is
//! handled by code-embedded migrations (`migrations`).

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
