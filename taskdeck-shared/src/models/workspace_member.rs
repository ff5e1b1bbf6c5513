/// Workspace membership model and database operations
///
/// A membership row links a user to a workspace. It is the only
/// authorization unit in Taskdeck: a user can reach a workspace's projects,
/// tasks and attachments if and only if such a row exists.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE workspace_role AS ENUM ('owner', 'admin', 'member');
///
/// CREATE TABLE workspace_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role workspace_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (workspace_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::workspace_member::{
///     CreateWorkspaceMember, WorkspaceMember, WorkspaceRole,
/// };
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, workspace_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// WorkspaceMember::create(&pool, CreateWorkspaceMember {
///     workspace_id,
///     user_id,
///     role: WorkspaceRole::Owner,
/// }).await?;
///
/// assert!(WorkspaceMember::is_member(&pool, workspace_id, user_id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::user::UserSummary;

/// Role recorded on a membership
///
/// Roles are informational: any membership grants full access to the
/// workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workspace_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    /// Created the workspace (assigned at signup)
    Owner,

    /// Invited with administrative intent
    Admin,

    /// Regular member
    Member,
}

impl WorkspaceRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Owner => "owner",
            WorkspaceRole::Admin => "admin",
            WorkspaceRole::Member => "member",
        }
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub created_at: DateTime<Utc>,
}

/// Member entry embedded in workspace listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    /// Membership ID
    pub id: Uuid,

    pub role: WorkspaceRole,

    pub user: UserSummary,
}

/// Input for creating a membership
#[derive(Debug, Clone)]
pub struct CreateWorkspaceMember {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    workspace_id: Uuid,
    role: WorkspaceRole,
    user_id: Uuid,
    email: String,
    name: Option<String>,
}

impl WorkspaceMember {
    /// Adds a user to a workspace
    ///
    /// # Errors
    ///
    /// Fails on a duplicate `(workspace_id, user_id)` pair or when either
    /// side doesn't exist.
    pub async fn create<'e, E>(executor: E, data: CreateWorkspaceMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let member = sqlx::query_as::<_, WorkspaceMember>(
            r#"
            INSERT INTO workspace_members (workspace_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, workspace_id, user_id, role, created_at
            "#,
        )
        .bind(data.workspace_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Checks whether the user belongs to the workspace
    pub async fn is_member<'e, E>(
        executor: E,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM workspace_members
                WHERE workspace_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Lists all memberships of a user, oldest first
    pub async fn list_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let members = sqlx::query_as::<_, WorkspaceMember>(
            r#"
            SELECT id, workspace_id, user_id, role, created_at
            FROM workspace_members
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(members)
    }

    /// Counts members of a workspace
    pub async fn count_by_workspace<'e, E>(executor: E, workspace_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM workspace_members WHERE workspace_id = $1")
                .bind(workspace_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    /// Lists members of the given workspaces joined with their user profile
    ///
    /// Returns `(workspace_id, member)` pairs ordered by join time.
    pub async fn list_with_users<'e, E>(
        executor: E,
        workspace_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, MemberWithUser)>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.id, m.workspace_id, m.role, u.id AS user_id, u.email, u.name
            FROM workspace_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.workspace_id = ANY($1)
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(workspace_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.workspace_id,
                    MemberWithUser {
                        id: row.id,
                        role: row.role,
                        user: UserSummary {
                            id: row.user_id,
                            email: row.email,
                            name: row.name,
                        },
                    },
                )
            })
            .collect())
    }
}
