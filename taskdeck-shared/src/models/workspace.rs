/// Workspace model and database operations
///
/// A workspace is the tenant boundary: it owns projects, and membership in
/// it (see [`super::workspace_member`]) is what grants access to everything
/// beneath it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE workspaces (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::workspace::{Workspace, CreateWorkspace};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let workspace = Workspace::create(&pool, CreateWorkspace {
///     name: "Ada Workspace".to_string(),
/// }).await?;
///
/// let mine = Workspace::list_for_user(&pool, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::workspace_member::{MemberWithUser, WorkspaceMember};

/// Workspace (tenant)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique workspace ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// When the workspace was created
    pub created_at: DateTime<Utc>,

    /// When the workspace was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new workspace
#[derive(Debug, Clone)]
pub struct CreateWorkspace {
    pub name: String,
}

/// A workspace together with its member list, as returned by `/workspaces/my`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceWithMembers {
    #[serde(flatten)]
    pub workspace: Workspace,

    pub members: Vec<MemberWithUser>,
}

/// Name given to the workspace created at signup
///
/// Mirrors the display name when one was provided, e.g. `"Ada Workspace"`,
/// and falls back to `"My Workspace"`.
pub fn default_workspace_name(display_name: Option<&str>) -> String {
    let prefix = display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("My");

    format!("{} Workspace", prefix)
}

impl Workspace {
    /// Creates a new workspace
    pub async fn create<'e, E>(executor: E, data: CreateWorkspace) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            INSERT INTO workspaces (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .fetch_one(executor)
        .await?;

        Ok(workspace)
    }

    /// Finds a workspace by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let workspace = sqlx::query_as::<_, Workspace>(
            "SELECT id, name, created_at, updated_at FROM workspaces WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(workspace)
    }

    /// Lists every workspace the user is a member of, oldest membership first
    pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let workspaces = sqlx::query_as::<_, Workspace>(
            r#"
            SELECT w.id, w.name, w.created_at, w.updated_at
            FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(workspaces)
    }

    /// Lists the user's workspaces with their full member lists
    ///
    /// Runs two queries (workspaces, then members of those workspaces) and
    /// stitches them together in memory.
    pub async fn list_for_user_with_members(
        pool: &sqlx::PgPool,
        user_id: Uuid,
    ) -> Result<Vec<WorkspaceWithMembers>, sqlx::Error> {
        let workspaces = Self::list_for_user(pool, user_id).await?;
        let ids: Vec<Uuid> = workspaces.iter().map(|w| w.id).collect();
        let members = WorkspaceMember::list_with_users(pool, &ids).await?;

        Ok(group_members(workspaces, members))
    }
}

/// Attaches each member row to its workspace, preserving workspace order
fn group_members(
    workspaces: Vec<Workspace>,
    members: Vec<(Uuid, MemberWithUser)>,
) -> Vec<WorkspaceWithMembers> {
    workspaces
        .into_iter()
        .map(|workspace| {
            let members = members
                .iter()
                .filter(|(workspace_id, _)| *workspace_id == workspace.id)
                .map(|(_, member)| member.clone())
                .collect();
            WorkspaceWithMembers { workspace, members }
        })
        .collect()
}
