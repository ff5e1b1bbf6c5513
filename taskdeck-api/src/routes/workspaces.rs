/// Workspace endpoints
///
/// - `GET /workspaces/my` - Workspaces the caller belongs to, with members

use crate::{app::AppState, error::ApiResult, extract::AppJson};
use axum::{extract::State, Extension};
use serde::Serialize;
use taskdeck_shared::{auth::middleware::AuthContext, models::workspace::{Workspace, WorkspaceWithMembers}};

#[derive(Debug, Serialize)]
pub struct WorkspacesResponse {
    pub workspaces: Vec<WorkspaceWithMembers>,
}

/// Lists the caller's workspaces
///
/// # Response
///
/// ```json
/// {
///   "workspaces": [{
///     "id": "uuid",
///     "name": "Ada Workspace",
///     "createdAt": "...",
///     "updatedAt": "...",
///     "members": [{ "id": "uuid", "role": "owner", "user": { "id": "uuid", "email": "...", "name": "Ada" } }]
///   }]
/// }
/// ```
pub async fn my_workspaces(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<AppJson<WorkspacesResponse>> {
    let workspaces = Workspace::list_for_user_with_members(&state.db, auth.user_id).await?;

    Ok(AppJson(WorkspacesResponse { workspaces }))
}
