/// Attachment model and database operations
///
/// An attachment row records a file uploaded to object storage for a task.
/// `file_url` holds the storage key, never a public URL; downloads go through
/// short-lived pre-signed links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Attachment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub file_name: String,

    /// Object storage key
    pub file_url: String,

    pub content_type: String,
    pub size_bytes: i64,
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Listing entry returned by `GET /attachments/task/:taskId`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub file_name: String,
    pub file_url: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub task_id: Uuid,
}

impl Attachment {
    pub async fn create<'e, E>(executor: E, data: CreateAttachment) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (file_name, file_url, content_type, size_bytes, task_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, file_name, file_url, content_type, size_bytes, task_id, created_at
            "#,
        )
        .bind(data.file_name)
        .bind(data.file_url)
        .bind(data.content_type)
        .bind(data.size_bytes)
        .bind(data.task_id)
        .fetch_one(executor)
        .await?;

        Ok(attachment)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, file_name, file_url, content_type, size_bytes, task_id, created_at
            FROM attachments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(attachment)
    }

    /// Lists a task's attachments, newest first
    pub async fn list_by_task<'e, E>(
        executor: E,
        task_id: Uuid,
    ) -> Result<Vec<AttachmentSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let attachments = sqlx::query_as::<_, AttachmentSummary>(
            r#"
            SELECT id, file_name, created_at
            FROM attachments
            WHERE task_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wire_shape() {
        let summary = AttachmentSummary {
            id: Uuid::new_v4(),
            file_name: "notes.txt".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["fileName"], "notes.txt");
        assert!(json["createdAt"].is_string());
        assert_eq!(json.as_object().unwrap().len(), 3);
    }
}
