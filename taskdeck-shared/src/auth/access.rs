/// Membership gate
///
/// Every protected operation on a workspace, project, task or attachment
/// goes through [`authorize`]. One query per resource kind walks the
/// ownership chain (attachment → task → project → workspace) and reports
/// whether the row exists and whether the caller is a member of the owning
/// workspace. [`evaluate`] turns that into a decision:
///
/// | Row | Member | Outcome |
/// |-----|--------|---------|
/// | absent | - | `NotFound` (404) |
/// | present | no | `Forbidden` (403) |
/// | present | yes | `Ok(workspace_id)` |
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::auth::access::{authorize, Resource};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let workspace_id = authorize(&pool, user_id, Resource::Task(task_id)).await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;

use sqlx::PgPool;
use uuid::Uuid;

/// Resource kinds guarded by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Workspace,
    Project,
    Task,
    Attachment,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Workspace => "Workspace",
            ResourceKind::Project => "Project",
            ResourceKind::Task => "Task",
            ResourceKind::Attachment => "Attachment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource identified by kind and ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Workspace(Uuid),
    Project(Uuid),
    Task(Uuid),
    Attachment(Uuid),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Workspace(_) => ResourceKind::Workspace,
            Resource::Project(_) => ResourceKind::Project,
            Resource::Task(_) => ResourceKind::Task,
            Resource::Attachment(_) => ResourceKind::Attachment,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Resource::Workspace(id)
            | Resource::Project(id)
            | Resource::Task(id)
            | Resource::Attachment(id) => id,
        }
    }

    fn ownership_query(&self) -> &'static str {
        match self {
            Resource::Workspace(_) => {
                r#"
                SELECT w.id AS workspace_id,
                       EXISTS(SELECT 1 FROM workspace_members m
                              WHERE m.workspace_id = w.id AND m.user_id = $2) AS is_member
                FROM workspaces w
                WHERE w.id = $1
                "#
            }
            Resource::Project(_) => {
                r#"
                SELECT p.workspace_id,
                       EXISTS(SELECT 1 FROM workspace_members m
                              WHERE m.workspace_id = p.workspace_id AND m.user_id = $2) AS is_member
                FROM projects p
                WHERE p.id = $1
                "#
            }
            Resource::Task(_) => {
                r#"
                SELECT p.workspace_id,
                       EXISTS(SELECT 1 FROM workspace_members m
                              WHERE m.workspace_id = p.workspace_id AND m.user_id = $2) AS is_member
                FROM tasks t
                JOIN projects p ON p.id = t.project_id
                WHERE t.id = $1
                "#
            }
            Resource::Attachment(_) => {
                r#"
                SELECT p.workspace_id,
                       EXISTS(SELECT 1 FROM workspace_members m
                              WHERE m.workspace_id = p.workspace_id AND m.user_id = $2) AS is_member
                FROM attachments a
                JOIN tasks t ON t.id = a.task_id
                JOIN projects p ON p.id = t.project_id
                WHERE a.id = $1
                "#
            }
        }
    }
}

/// Ownership facts about one resource, as read from the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct Ownership {
    pub workspace_id: Uuid,
    pub is_member: bool,
}

/// Gate refusal
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("{0} not found")]
    NotFound(ResourceKind),

    #[error("You do not have access to this {}", .0.as_str().to_lowercase())]
    Forbidden(ResourceKind),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Decides access from the ownership lookup
pub fn evaluate(kind: ResourceKind, ownership: Option<Ownership>) -> Result<Uuid, AccessError> {
    match ownership {
        None => Err(AccessError::NotFound(kind)),
        Some(Ownership { is_member: false, .. }) => Err(AccessError::Forbidden(kind)),
        Some(Ownership { workspace_id, .. }) => Ok(workspace_id),
    }
}

/// Checks that `user_id` may access `resource`
///
/// Returns the ID of the workspace owning the resource.
///
/// # Errors
///
/// `AccessError::NotFound` when the resource doesn't exist,
/// `AccessError::Forbidden` when the caller isn't a member of its workspace.
pub async fn authorize(pool: &PgPool, user_id: Uuid, resource: Resource) -> Result<Uuid, AccessError> {
    let ownership = sqlx::query_as::<_, Ownership>(resource.ownership_query())
        .bind(resource.id())
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let decision = evaluate(resource.kind(), ownership);

    if let Err(AccessError::Forbidden(kind)) = &decision {
        tracing::debug!(%user_id, resource = %kind, id = %resource.id(), "membership gate refused access");
    }

    decision
}
