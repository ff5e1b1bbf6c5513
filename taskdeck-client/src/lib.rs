//! Taskdeck client
//!
//! Typed HTTP client for the Taskdeck API plus the pieces behind the
//! `taskdeck` terminal dashboard.

pub mod client;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use error::{ClientError, ClientResult};
pub use session::Session;
