/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login and current user
/// - `workspaces`: Workspaces of the caller
/// - `projects`: Project CRUD with task stats
/// - `tasks`: Task CRUD
/// - `attachments`: File upload, listing and pre-signed downloads

pub mod attachments;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod workspaces;

use crate::error::ApiError;
use serde::Serialize;
use std::sync::Arc;
use taskdeck_shared::auth::access::ResourceKind;
use taskdeck_shared::storage::ObjectStorage;
use uuid::Uuid;

/// Plain `{"message": ...}` response body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Parses a path id; a malformed id can't name an existing row, so it is
/// reported as "<Kind> not found"
pub fn parse_id(raw: &str, kind: ResourceKind) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", kind)))
}

/// Removes stored objects whose database rows are already gone
///
/// Failures are logged and otherwise ignored.
pub(crate) async fn delete_objects_best_effort(storage: Arc<dyn ObjectStorage>, keys: Vec<String>) {
    for key in keys {
        if let Err(e) = storage.delete_object(&key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete stored object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), ResourceKind::Task).unwrap(), id);
    }

    #[test]
    fn test_parse_id_malformed_is_not_found() {
        let err = parse_id("not-a-uuid", ResourceKind::Project).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found: Project not found");
    }

    #[tokio::test]
    async fn test_best_effort_delete_removes_objects() {
        use bytes::Bytes;
        use taskdeck_shared::storage::MemoryStorage;

        let memory = MemoryStorage::new();
        memory
            .put_object("attachments/a.txt", Bytes::from_static(b"a"), "text/plain")
            .await
            .unwrap();

        let storage: Arc<dyn ObjectStorage> = Arc::new(memory.clone());
        delete_objects_best_effort(
            storage,
            vec!["attachments/a.txt".to_string(), "attachments/missing".to_string()],
        )
        .await;

        assert!(memory.is_empty().await);
    }
}
