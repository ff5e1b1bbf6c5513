//! # Taskdeck Shared Library
//!
//! Types, persistence and authentication logic shared by the Taskdeck API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Password hashing, JWT, request authentication and the membership gate
//! - `db`: Connection pool and migrations
//! - `storage`: Object storage for attachment payloads

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
