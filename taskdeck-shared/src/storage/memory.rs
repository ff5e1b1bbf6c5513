/// In-process object storage
///
/// Keeps objects in a map behind a tokio `RwLock`. Pre-signed links have the
/// form `<base>/<key>?expires=<unix seconds>` and can be resolved back to the
/// stored bytes with [`MemoryStorage::fetch_presigned`], which enforces the
/// expiry the same way a real store would.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ObjectStorage, StorageError};

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct MemoryStorage {
    base_url: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_base_url("memory://taskdeck")
    }

    /// Uses `base_url` as the prefix of generated links
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Resolves a link produced by [`ObjectStorage::presigned_get_url`] as of `now`
    ///
    /// # Errors
    ///
    /// `StorageError::Expired` once the link's expiry has passed,
    /// `StorageError::NotFound` for unknown links or keys.
    pub async fn fetch_presigned(&self, url: &str, now: DateTime<Utc>) -> Result<StoredObject, StorageError> {
        let not_found = || StorageError::NotFound(url.to_string());

        let rest = url
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(not_found)?;
        let (key, query) = rest.split_once("?expires=").ok_or_else(not_found)?;
        let expires: i64 = query.parse().map_err(|_| not_found())?;

        if now.timestamp() >= expires {
            return Err(StorageError::Expired);
        }

        self.get(key).await.ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        if !self.objects.read().await.contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let expires = Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!("{}/{}?expires={}", self.base_url, key, expires))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
