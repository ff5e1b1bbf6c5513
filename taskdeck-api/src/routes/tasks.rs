/// Task endpoints
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task in a project
/// - `GET /tasks?projectId=` - List visible tasks, newest first
/// - `GET /tasks/:id` - Fetch one task
/// - `PUT /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete with its attachments
///
/// # Partial updates
///
/// Absent fields keep their stored value. `description`, `dueDate` and
/// `assigneeId` can be cleared with an explicit `null`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, AppJson, AppPath, AppQuery},
    routes::{delete_objects_best_effort, parse_id, MessageResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use taskdeck_shared::{
    auth::{
        access::{authorize, Resource, ResourceKind},
        middleware::AuthContext,
    },
    models::{
        task::{parse_due_date, CreateTask, Task, TaskFieldError, TaskPriority, UpdateTask},
        workspace_member::WorkspaceMember,
    },
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub project_id: Option<Uuid>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<String>,

    pub priority: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

impl TryFrom<UpdateTaskRequest> for UpdateTask {
    type Error = TaskFieldError;

    fn try_from(req: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let due_date = match req.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_due_date(&raw)?)),
        };

        Ok(UpdateTask {
            title: req
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            description: req.description,
            status: req.status.as_deref().map(str::parse).transpose()?,
            priority: req.priority.as_deref().map(str::parse).transpose()?,
            due_date,
            assignee_id: req.assignee_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

/// Rejects assignees outside the task's workspace
async fn ensure_assignee_is_member(
    db: &PgPool,
    workspace_id: Uuid,
    assignee_id: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(assignee_id) = assignee_id {
        if !WorkspaceMember::is_member(db, workspace_id, assignee_id).await? {
            return Err(ApiError::BadRequest(
                "assigneeId must be a member of the task's workspace".to_string(),
            ));
        }
    }
    Ok(())
}

/// Creates a task in `todo` status
///
/// # Errors
///
/// - `400`: `title` or `projectId` missing, bad priority or due date,
///   assignee outside the workspace
/// - `404`: Project doesn't exist
/// - `403`: Caller isn't a member of the project's workspace
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, AppJson<TaskResponse>)> {
    let title = req.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let (title, project_id) = match (title, req.project_id) {
        (Some(title), Some(project_id)) => (title, project_id),
        (title, project_id) => {
            let mut missing = Vec::new();
            if title.is_none() {
                missing.push("title");
            }
            if project_id.is_none() {
                missing.push("projectId");
            }
            return Err(ApiError::missing_fields(&missing));
        }
    };

    let priority = match req.priority.as_deref() {
        Some(raw) => raw.parse::<TaskPriority>()?,
        None => TaskPriority::default(),
    };
    let due_date = req.due_date.as_deref().map(parse_due_date).transpose()?;

    let workspace_id = authorize(&state.db, auth.user_id, Resource::Project(project_id)).await?;
    ensure_assignee_is_member(&state.db, workspace_id, req.assignee_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            description: req.description,
            priority,
            due_date,
            assignee_id: req.assignee_id,
            project_id,
        },
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, %project_id, "Task created");

    Ok((StatusCode::CREATED, AppJson(TaskResponse { task })))
}

/// Lists tasks, optionally restricted to one project
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListTasksQuery>,
) -> ApiResult<AppJson<TasksResponse>> {
    if let Some(project_id) = query.project_id {
        authorize(&state.db, auth.user_id, Resource::Project(project_id)).await?;
    }

    let tasks = Task::list_for_user(&state.db, auth.user_id, query.project_id).await?;

    Ok(AppJson(TasksResponse { tasks }))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
) -> ApiResult<AppJson<TaskResponse>> {
    let id = parse_id(&id, ResourceKind::Task)?;
    authorize(&state.db, auth.user_id, Resource::Task(id)).await?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(AppJson(TaskResponse { task }))
}

/// Applies a partial update
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
    AppJson(req): AppJson<UpdateTaskRequest>,
) -> ApiResult<AppJson<TaskResponse>> {
    let id = parse_id(&id, ResourceKind::Task)?;
    let update = UpdateTask::try_from(req)?;

    let workspace_id = authorize(&state.db, auth.user_id, Resource::Task(id)).await?;
    if let Some(assignee_id) = update.assignee_id {
        ensure_assignee_is_member(&state.db, workspace_id, assignee_id).await?;
    }

    let task = if update.is_empty() {
        Task::find_by_id(&state.db, id).await?
    } else {
        Task::update(&state.db, id, update).await?
    }
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(user_id = %auth.user_id, task_id = %id, "Task updated");

    Ok(AppJson(TaskResponse { task }))
}

/// Deletes a task and its attachments
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
) -> ApiResult<AppJson<MessageResponse>> {
    let id = parse_id(&id, ResourceKind::Task)?;
    authorize(&state.db, auth.user_id, Resource::Task(id)).await?;

    let keys = Task::delete_cascade(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, task_id = %id, attachments = keys.len(), "Task deleted");

    delete_objects_best_effort(state.storage.clone(), keys).await;

    Ok(AppJson(MessageResponse::new("Task deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use taskdeck_shared::models::task::TaskStatus;

    fn update(json: serde_json::Value) -> Result<UpdateTask, TaskFieldError> {
        let req: UpdateTaskRequest = serde_json::from_value(json).unwrap();
        UpdateTask::try_from(req)
    }

    #[test]
    fn test_update_absent_fields_are_kept() {
        let update = update(serde_json::json!({ "status": "in_progress" })).unwrap();
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert_eq!(update.due_date, None);
        assert_eq!(update.description, None);
        assert_eq!(update.assignee_id, None);
    }

    #[test]
    fn test_update_null_clears_nullable_fields() {
        let update = update(serde_json::json!({
            "description": null,
            "dueDate": null,
            "assigneeId": null
        }))
        .unwrap();
        assert_eq!(update.description, Some(None));
        assert_eq!(update.due_date, Some(None));
        assert_eq!(update.assignee_id, Some(None));
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_parses_due_date() {
        let update = update(serde_json::json!({ "dueDate": "2026-03-01" })).unwrap();
        assert_eq!(
            update.due_date,
            Some(Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_update_rejects_unknown_priority() {
        let err = update(serde_json::json!({ "priority": "urgent" })).unwrap_err();
        assert_eq!(err, TaskFieldError::Priority("urgent".to_string()));
    }

    #[test]
    fn test_update_blank_title_keeps_current() {
        let update = update(serde_json::json!({ "title": "  " })).unwrap();
        assert!(update.is_empty());
    }
}
