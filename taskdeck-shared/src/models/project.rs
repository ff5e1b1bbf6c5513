/// Project model and database operations
///
/// Projects belong to exactly one workspace and own tasks. Deleting a
/// project removes its tasks (and their attachment rows) explicitly inside
/// one transaction; the schema does not cascade.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Project inside a workspace
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub workspace_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task counters shown on the project detail view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskStats {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
    pub high_priority: i64,
}

/// Project plus its task counters, as returned by `GET /projects/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithStats {
    #[serde(flatten)]
    pub project: Project,

    pub stats: TaskStats,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub workspace_id: Uuid,
}

/// Fields to change on a project; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Outcome of a project deletion
#[derive(Debug, Clone, Default)]
pub struct DeletedProject {
    /// Number of tasks removed along with the project
    pub deleted_tasks: u64,

    /// Storage keys of the attachments whose rows were removed
    pub orphaned_objects: Vec<String>,
}

const PROJECT_COLUMNS: &str = "id, name, description, workspace_id, created_at, updated_at";

impl Project {
    /// Creates a project
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, description, workspace_id) VALUES ($1, $2, $3) RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.workspace_id)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Lists projects visible to a user, newest first
    ///
    /// With `workspace_id` set, only that workspace's projects are returned;
    /// otherwise projects from every workspace the user belongs to.
    pub async fn list_for_user<'e, E>(
        executor: E,
        user_id: Uuid,
        workspace_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.workspace_id, p.created_at, p.updated_at
            FROM projects p
            WHERE EXISTS (
                SELECT 1 FROM workspace_members m
                WHERE m.workspace_id = p.workspace_id AND m.user_id = $1
            )
            AND ($2::uuid IS NULL OR p.workspace_id = $2)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(workspace_id)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Computes task counters for a project
    pub async fn task_stats<'e, E>(executor: E, id: Uuid) -> Result<TaskStats, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let stats = sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'todo') AS todo,
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'done') AS done,
                COUNT(*) FILTER (WHERE priority = 'high') AS high_priority
            FROM tasks
            WHERE project_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(stats)
    }

    /// Updates a project, keeping stored values for absent fields
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Deletes a project together with its tasks and their attachment rows
    ///
    /// Children are removed first, all inside one transaction. Returns
    /// `None` if the project doesn't exist.
    pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<Option<DeletedProject>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let orphaned_objects: Vec<String> = sqlx::query_scalar(
            r#"
            DELETE FROM attachments
            WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)
            RETURNING file_url
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted_tasks = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;

        Ok(Some(DeletedProject {
            deleted_tasks,
            orphaned_objects,
        }))
    }
}
