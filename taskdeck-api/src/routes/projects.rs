/// Project endpoints
///
/// # Endpoints
///
/// - `POST /projects` - Create a project in a workspace
/// - `GET /projects?workspaceId=` - List visible projects, newest first
/// - `GET /projects/:id` - Project with task stats
/// - `PUT /projects/:id` - Rename / re-describe
/// - `DELETE /projects/:id` - Delete with its tasks and attachments
///
/// Every endpoint runs the membership gate on the workspace owning the
/// project before touching it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    routes::{delete_objects_best_effort, parse_id},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{
        access::{authorize, Resource, ResourceKind},
        middleware::AuthContext,
    },
    models::project::{CreateProject, Project, ProjectWithStats, UpdateProject},
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub workspace_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsQuery {
    pub workspace_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    /// Blank or absent keeps the current name
    pub name: Option<String>,

    /// Absent or null keeps the current description
    pub description: Option<String>,
}

impl From<UpdateProjectRequest> for UpdateProject {
    fn from(req: UpdateProjectRequest) -> Self {
        UpdateProject {
            name: req
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            description: req.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub project: ProjectWithStats,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProjectResponse {
    pub message: String,
    pub deleted_tasks: u64,
}

/// Creates a project
///
/// # Errors
///
/// - `400`: `name` or `workspaceId` missing
/// - `404`: Workspace doesn't exist
/// - `403`: Caller isn't a member of the workspace
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, AppJson<ProjectResponse>)> {
    let name = req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    let (name, workspace_id) = match (name, req.workspace_id) {
        (Some(name), Some(workspace_id)) => (name, workspace_id),
        (name, workspace_id) => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("name");
            }
            if workspace_id.is_none() {
                missing.push("workspaceId");
            }
            return Err(ApiError::missing_fields(&missing));
        }
    };

    authorize(&state.db, auth.user_id, Resource::Workspace(workspace_id)).await?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name,
            description: req.description,
            workspace_id,
        },
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, project_id = %project.id, %workspace_id, "Project created");

    Ok((StatusCode::CREATED, AppJson(ProjectResponse { project })))
}

/// Lists projects, optionally restricted to one workspace
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListProjectsQuery>,
) -> ApiResult<AppJson<ProjectsResponse>> {
    if let Some(workspace_id) = query.workspace_id {
        authorize(&state.db, auth.user_id, Resource::Workspace(workspace_id)).await?;
    }

    let projects = Project::list_for_user(&state.db, auth.user_id, query.workspace_id).await?;

    Ok(AppJson(ProjectsResponse { projects }))
}

/// Fetches a project with its task counters
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
) -> ApiResult<AppJson<ProjectDetailResponse>> {
    let id = parse_id(&id, ResourceKind::Project)?;
    authorize(&state.db, auth.user_id, Resource::Project(id)).await?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    let stats = Project::task_stats(&state.db, id).await?;

    Ok(AppJson(ProjectDetailResponse {
        project: ProjectWithStats { project, stats },
    }))
}

/// Updates a project's name and description
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
    AppJson(req): AppJson<UpdateProjectRequest>,
) -> ApiResult<AppJson<ProjectResponse>> {
    let id = parse_id(&id, ResourceKind::Project)?;
    authorize(&state.db, auth.user_id, Resource::Project(id)).await?;

    let project = Project::update(&state.db, id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(AppJson(ProjectResponse { project }))
}

/// Deletes a project, its tasks and their attachments
///
/// Stored files are removed after the transaction commits; storage failures
/// are only logged.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
) -> ApiResult<AppJson<DeleteProjectResponse>> {
    let id = parse_id(&id, ResourceKind::Project)?;
    authorize(&state.db, auth.user_id, Resource::Project(id)).await?;

    let deleted = Project::delete_cascade(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(
        user_id = %auth.user_id,
        project_id = %id,
        deleted_tasks = deleted.deleted_tasks,
        "Project deleted"
    );

    delete_objects_best_effort(state.storage.clone(), deleted.orphaned_objects).await;

    Ok(AppJson(DeleteProjectResponse {
        message: "Project deleted successfully".to_string(),
        deleted_tasks: deleted.deleted_tasks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_keeps_current() {
        let update: UpdateProject = UpdateProjectRequest {
            name: Some("   ".to_string()),
            description: Some("new".to_string()),
        }
        .into();
        assert_eq!(update.name, None);
        assert_eq!(update.description.as_deref(), Some("new"));
    }

    #[test]
    fn test_create_request_reads_camel_case() {
        let id = Uuid::new_v4();
        let req: CreateProjectRequest =
            serde_json::from_value(serde_json::json!({ "name": "Launch", "workspaceId": id })).unwrap();
        assert_eq!(req.workspace_id, Some(id));
        assert_eq!(req.description, None);
    }

    #[test]
    fn test_delete_response_shape() {
        let json = serde_json::to_value(DeleteProjectResponse {
            message: "Project deleted successfully".to_string(),
            deleted_tasks: 3,
        })
        .unwrap();
        assert_eq!(json["deletedTasks"], 3);
    }
}
