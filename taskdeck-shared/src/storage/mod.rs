/// Object storage for attachment payloads
///
/// Attachment bytes never touch the database. The API writes them through an
/// [`ObjectStorage`] implementation and hands clients short-lived pre-signed
/// GET links instead of proxying downloads.
///
/// # Implementations
///
/// - [`s3::S3Storage`]: AWS S3 or any S3-compatible endpoint
/// - [`memory::MemoryStorage`]: process-local map used by tests and local runs
///
/// Keys are built by [`keys::attachment_key`].

pub mod keys;
pub mod memory;
pub mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub use keys::{attachment_key, DOWNLOAD_URL_TTL, MAX_UPLOAD_BYTES};
pub use memory::MemoryStorage;
pub use s3::S3Storage;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to upload object '{key}': {message}")]
    Upload { key: String, message: String },

    #[error("Failed to presign object '{key}': {message}")]
    Presign { key: String, message: String },

    #[error("Failed to delete object '{key}': {message}")]
    Delete { key: String, message: String },

    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Download link expired")]
    Expired,
}

/// Blob store used for attachments
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `body` under `key`, returning once the write is durable
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Produces a GET link for `key` valid for `expires_in`
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;

    /// Removes `key`; deleting a missing key is not an error
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;
}
