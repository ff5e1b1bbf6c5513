//! Client tests against an in-process stub of the Taskdeck API

use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use taskdeck_client::dashboard::{load_dashboard, render_dashboard};
use taskdeck_client::types::{TaskPatch, TaskStatus};
use taskdeck_client::{ApiClient, ClientError};
use uuid::Uuid;

const TOKEN: &str = "stub-token";
const WORKSPACE_ID: &str = "11111111-1111-1111-1111-111111111111";
const PROJECT_ID: &str = "22222222-2222-2222-2222-222222222222";
const TASK_ID: &str = "33333333-3333-3333-3333-333333333333";
const AT: &str = "2026-03-01T12:00:00Z";

type Reply = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap) -> Result<(), Reply> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err(error(StatusCode::UNAUTHORIZED, "Invalid token")),
        None => Err(error(StatusCode::UNAUTHORIZED, "No token provided")),
    }
}

fn error(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(json!({ "error": "stub", "message": message })),
    )
}

fn user() -> Value {
    json!({ "id": Uuid::nil(), "email": "ada@example.com", "name": "Ada" })
}

fn project() -> Value {
    json!({
        "id": PROJECT_ID,
        "name": "Launch",
        "description": null,
        "workspaceId": WORKSPACE_ID,
        "createdAt": AT,
        "updatedAt": AT
    })
}

fn task(status: &str) -> Value {
    json!({
        "id": TASK_ID,
        "title": "Write docs",
        "description": null,
        "status": status,
        "priority": "medium",
        "dueDate": null,
        "assigneeId": null,
        "projectId": PROJECT_ID,
        "createdAt": AT,
        "updatedAt": AT
    })
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] == "right" {
        (
            StatusCode::OK,
            Json(json!({ "message": "Login successful", "user": user(), "token": TOKEN })),
        )
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn workspaces(headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    Ok(Json(json!({
        "workspaces": [{
            "id": WORKSPACE_ID,
            "name": "Ada's Workspace",
            "createdAt": AT,
            "members": [{ "id": Uuid::nil(), "role": "owner", "user": user() }]
        }]
    })))
}

async fn projects(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    match query.get("workspaceId").map(String::as_str) {
        Some(WORKSPACE_ID) | None => Ok(Json(json!({ "projects": [project()] }))),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "Not a member of this workspace")),
    }
}

async fn project_detail(headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    if id != PROJECT_ID {
        return Err(error(StatusCode::NOT_FOUND, "Project not found"));
    }

    let mut detail = project();
    detail["stats"] = json!({ "total": 1, "todo": 1, "in_progress": 0, "done": 0, "high_priority": 0 });
    Ok(Json(json!({ "project": detail })))
}

async fn tasks(headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    Ok(Json(json!({ "tasks": [task("todo")] })))
}

async fn update_task(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, Reply> {
    authorized(&headers)?;
    // Echo back the status and whether dueDate arrived as an explicit null
    let status = body["status"].as_str().unwrap_or("todo").to_string();
    let mut updated = task(&status);
    updated["description"] = json!(format!("dueDate null: {}", body.get("dueDate") == Some(&Value::Null)));
    Ok(Json(json!({ "task": updated })))
}

async fn upload(headers: HeaderMap, mut multipart: Multipart) -> Result<Reply, Reply> {
    authorized(&headers)?;

    let mut task_id = None;
    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("taskId") => task_id = field.text().await.ok(),
            Some("file") => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                file = Some((file_name, content_type, size));
            }
            _ => {}
        }
    }

    let (Some(task_id), Some((file_name, content_type, size))) = (task_id, file) else {
        return Err(error(StatusCode::BAD_REQUEST, "file and taskId are required"));
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "File uploaded successfully",
            "attachment": {
                "id": Uuid::nil(),
                "fileName": file_name,
                "fileUrl": format!("attachments/{}/1-x.txt", task_id),
                "contentType": content_type,
                "sizeBytes": size,
                "taskId": task_id,
                "createdAt": AT
            }
        })),
    ))
}

async fn no_message() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/workspaces/my", get(workspaces))
        .route("/projects", get(projects))
        .route("/projects/:id", get(project_detail))
        .route("/tasks", get(tasks))
        .route("/tasks/:id", put(update_task))
        .route("/attachments", post(upload))
        .route("/attachments/task/:id", get(no_message));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn logged_in() -> ApiClient {
    ApiClient::new(spawn_stub().await).unwrap().with_token(TOKEN)
}

#[tokio::test]
async fn test_login_returns_token() {
    let client = ApiClient::new(spawn_stub().await).unwrap();

    let auth = client.login("ada@example.com", "right").await.unwrap();
    assert_eq!(auth.token, TOKEN);
    assert_eq!(auth.user.email, "ada@example.com");
    assert!(auth.workspace.is_none());
}

#[tokio::test]
async fn test_server_message_surfaces_verbatim() {
    let client = ApiClient::new(spawn_stub().await).unwrap();

    let err = client.login("ada@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Invalid credentials");

    let client = client.with_token("stale");
    let err = client.workspaces().await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid token");
}

#[tokio::test]
async fn test_error_without_message_falls_back() {
    let client = logged_in().await;

    let err = client.attachments(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 500, .. }));
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_forbidden_filter() {
    let client = logged_in().await;

    let err = client.projects(Some(Uuid::new_v4())).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "Not a member of this workspace");
}

#[tokio::test]
async fn test_dashboard_loads_first_workspace_and_project() {
    let client = logged_in().await;

    let dashboard = load_dashboard(&client, None, None).await.unwrap();

    assert_eq!(dashboard.workspaces.len(), 1);
    assert_eq!(dashboard.workspaces[0].members[0].role, "owner");
    assert_eq!(dashboard.selected_workspace.unwrap().to_string(), WORKSPACE_ID);
    let detail = dashboard.selected_project.as_ref().unwrap();
    assert_eq!(detail.stats.total, 1);
    assert_eq!(dashboard.tasks.len(), 1);

    let rendered = render_dashboard(&dashboard);
    assert!(rendered.contains("* Ada's Workspace"));
    assert!(rendered.contains("* Launch"));
    assert!(rendered.contains("Write docs"));
}

#[tokio::test]
async fn test_update_task_sends_explicit_null() {
    let client = logged_in().await;
    let patch = TaskPatch {
        status: Some(TaskStatus::Done),
        due_date: Some(None),
        ..Default::default()
    };

    let task = client.update_task(TASK_ID.parse().unwrap(), &patch).await.unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.description.as_deref(), Some("dueDate null: true"));
}

#[tokio::test]
async fn test_upload_sends_multipart_parts() {
    let client = logged_in().await;
    let task_id: Uuid = TASK_ID.parse().unwrap();

    let attachment = client
        .upload_attachment(task_id, "notes.txt", "text/plain", b"hello".to_vec())
        .await
        .unwrap();

    assert_eq!(attachment.file_name, "notes.txt");
    assert_eq!(attachment.content_type, "text/plain");
    assert_eq!(attachment.size_bytes, 5);
    assert_eq!(attachment.task_id, task_id);
}
