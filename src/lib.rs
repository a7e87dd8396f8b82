//! Chirp - A small Twitter-style social backend
//!
//! This library provides the core functionality for the Chirp service:
//! accounts, the follow graph, tweets, comments, and likes.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
