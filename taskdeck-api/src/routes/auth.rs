/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Signup (user + default workspace + owner membership)
/// - Login
/// - Current user
///
/// # Endpoints
///
/// - `POST /auth/signup` - Register new user
/// - `POST /auth/login` - Login and get a token
/// - `GET /auth/me` - Profile of the token's user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
};
use axum::{extract::State, http::StatusCode, Extension};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        user::{CreateUser, User, UserSummary},
        workspace::{default_workspace_name, CreateWorkspace, Workspace},
        workspace_member::{CreateWorkspaceMember, WorkspaceMember, WorkspaceRole},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub name: Option<String>,
}

impl SignupRequest {
    /// Trims email and name so format checks see what gets stored
    fn normalized(self) -> Self {
        Self {
            email: present(self.email),
            password: self.password,
            name: present(self.name),
        }
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Workspace reference returned at signup
#[derive(Debug, Serialize)]
pub struct WorkspaceRef {
    pub id: Uuid,
    pub name: String,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserSummary,
    pub workspace: WorkspaceRef,
    pub token: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
    pub token: String,
}

/// Current user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserSummary,
}

/// Returns the trimmed value, treating blank strings as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pairs up required credentials or names the missing ones
fn require_credentials(
    email: Option<String>,
    password: Option<String>,
) -> ApiResult<(String, String)> {
    // Passwords are taken as typed; only an empty one counts as missing
    let password = password.filter(|p| !p.is_empty());

    match (present(email), password) {
        (Some(email), Some(password)) => Ok((email, password)),
        (email, password) => {
            let mut missing = Vec::new();
            if email.is_none() {
                missing.push("email");
            }
            if password.is_none() {
                missing.push("password");
            }
            Err(ApiError::missing_fields(&missing))
        }
    }
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = jwt::Claims::with_expiration(
        user.id,
        user.email.clone(),
        Duration::hours(state.config.jwt.ttl_hours),
    );

    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// Register a new user
///
/// Creates the user, a default workspace named after them and an `owner`
/// membership in one transaction.
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "correct horse",
///   "name": "Ada"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "User created successfully",
///   "user": { "id": "uuid", "email": "ada@example.com", "name": "Ada" },
///   "workspace": { "id": "uuid", "name": "Ada Workspace" },
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid fields
/// - `409 Conflict`: Email already exists
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<(StatusCode, AppJson<SignupResponse>)> {
    let req = req.normalized();
    req.validate()?;

    let (email, password) = require_credentials(req.email, req.password)?;
    let name = req.name;

    if User::email_exists(&state.db, &email).await? {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password_blocking(password).await?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email,
            password_hash,
            name: name.clone(),
        },
    )
    .await?;

    let workspace = Workspace::create(
        &mut *tx,
        CreateWorkspace {
            name: default_workspace_name(name.as_deref()),
        },
    )
    .await?;

    WorkspaceMember::create(
        &mut *tx,
        CreateWorkspaceMember {
            workspace_id: workspace.id,
            user_id: user.id,
            role: WorkspaceRole::Owner,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, workspace_id = %workspace.id, "User signed up");

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        AppJson(SignupResponse {
            message: "User created successfully".to_string(),
            user: user.summary(),
            workspace: WorkspaceRef {
                id: workspace.id,
                name: workspace.name,
            },
            token,
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<AppJson<LoginResponse>> {
    let (email, password) = require_credentials(req.email, req.password)?;
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    let valid = password::verify_password_blocking(password, user.password_hash.clone()).await?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = issue_token(&state, &user)?;

    Ok(AppJson(LoginResponse {
        message: "Login successful".to_string(),
        user: user.summary(),
        token,
    }))
}

/// Returns the authenticated user
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: The token names a user that no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<AppJson<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(AppJson(MeResponse {
        user: user.summary(),
    }))
}
