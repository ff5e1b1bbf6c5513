//! Typed client for the Taskdeck REST API
//!
//! # Example
//!
//! ```no_run
//! use taskdeck_client::ApiClient;
//!
//! # async fn example() -> Result<(), taskdeck_client::ClientError> {
//! let client = ApiClient::new("http://localhost:4000")?;
//! let auth = client.login("ada@example.com", "correct horse").await?;
//! let client = client.with_token(auth.token);
//!
//! for workspace in client.workspaces().await? {
//!     println!("{}", workspace.name);
//! }
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use reqwest::{multipart, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::types::*;

/// Fallback when an error response carries no `message`
const GENERIC_FAILURE: &str = "Request failed";

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserSummary,
}

#[derive(Deserialize)]
struct WorkspacesEnvelope {
    workspaces: Vec<Workspace>,
}

#[derive(Deserialize)]
struct ProjectEnvelope<P> {
    project: P,
}

#[derive(Deserialize)]
struct ProjectsEnvelope {
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    task: Task,
}

#[derive(Deserialize)]
struct TasksEnvelope {
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct AttachmentEnvelope {
    attachment: Attachment,
}

#[derive(Deserialize)]
struct AttachmentsEnvelope {
    attachments: Vec<AttachmentSummary>,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    message: String,
}

/// REST client; cheap to clone
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Sends `token` as the bearer credential on authenticated calls
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(builder.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        Ok(response.json::<T>().await?)
    }

    // Auth

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> ClientResult<AuthResponse> {
        let body = json!({ "email": email, "password": password, "name": name });
        self.send(self.http.post(self.url("/auth/signup")).json(&body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        self.send(self.http.post(self.url("/auth/login")).json(&body)).await
    }

    pub async fn me(&self) -> ClientResult<UserSummary> {
        let envelope: UserEnvelope = self.send(self.authed(self.http.get(self.url("/auth/me")))?).await?;
        Ok(envelope.user)
    }

    // Workspaces

    pub async fn workspaces(&self) -> ClientResult<Vec<Workspace>> {
        let envelope: WorkspacesEnvelope = self
            .send(self.authed(self.http.get(self.url("/workspaces/my")))?)
            .await?;
        Ok(envelope.workspaces)
    }

    // Projects

    pub async fn projects(&self, workspace_id: Option<Uuid>) -> ClientResult<Vec<Project>> {
        let mut request = self.http.get(self.url("/projects"));
        if let Some(workspace_id) = workspace_id {
            request = request.query(&[("workspaceId", workspace_id.to_string())]);
        }

        let envelope: ProjectsEnvelope = self.send(self.authed(request)?).await?;
        Ok(envelope.projects)
    }

    pub async fn create_project(&self, project: &NewProject) -> ClientResult<Project> {
        let envelope: ProjectEnvelope<Project> = self
            .send(self.authed(self.http.post(self.url("/projects")).json(project))?)
            .await?;
        Ok(envelope.project)
    }

    pub async fn project(&self, id: Uuid) -> ClientResult<ProjectDetail> {
        let envelope: ProjectEnvelope<ProjectDetail> = self
            .send(self.authed(self.http.get(self.url(&format!("/projects/{}", id))))?)
            .await?;
        Ok(envelope.project)
    }

    pub async fn update_project(&self, id: Uuid, patch: &ProjectPatch) -> ClientResult<Project> {
        let request = self.http.put(self.url(&format!("/projects/{}", id))).json(patch);
        let envelope: ProjectEnvelope<Project> = self.send(self.authed(request)?).await?;
        Ok(envelope.project)
    }

    pub async fn delete_project(&self, id: Uuid) -> ClientResult<DeletedProject> {
        self.send(self.authed(self.http.delete(self.url(&format!("/projects/{}", id))))?)
            .await
    }

    // Tasks

    pub async fn tasks(&self, project_id: Option<Uuid>) -> ClientResult<Vec<Task>> {
        let mut request = self.http.get(self.url("/tasks"));
        if let Some(project_id) = project_id {
            request = request.query(&[("projectId", project_id.to_string())]);
        }

        let envelope: TasksEnvelope = self.send(self.authed(request)?).await?;
        Ok(envelope.tasks)
    }

    pub async fn create_task(&self, task: &NewTask) -> ClientResult<Task> {
        let envelope: TaskEnvelope = self
            .send(self.authed(self.http.post(self.url("/tasks")).json(task))?)
            .await?;
        Ok(envelope.task)
    }

    pub async fn task(&self, id: Uuid) -> ClientResult<Task> {
        let envelope: TaskEnvelope = self
            .send(self.authed(self.http.get(self.url(&format!("/tasks/{}", id))))?)
            .await?;
        Ok(envelope.task)
    }

    pub async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> ClientResult<Task> {
        let request = self.http.put(self.url(&format!("/tasks/{}", id))).json(patch);
        let envelope: TaskEnvelope = self.send(self.authed(request)?).await?;
        Ok(envelope.task)
    }

    /// Returns the server's confirmation message
    pub async fn delete_task(&self, id: Uuid) -> ClientResult<String> {
        let envelope: MessageEnvelope = self
            .send(self.authed(self.http.delete(self.url(&format!("/tasks/{}", id))))?)
            .await?;
        Ok(envelope.message)
    }

    // Attachments

    pub async fn upload_attachment(
        &self,
        task_id: Uuid,
        file_name: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> ClientResult<Attachment> {
        let file = multipart::Part::bytes(body)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = multipart::Form::new()
            .text("taskId", task_id.to_string())
            .part("file", file);

        let request = self.http.post(self.url("/attachments")).multipart(form);
        let envelope: AttachmentEnvelope = self.send(self.authed(request)?).await?;
        Ok(envelope.attachment)
    }

    pub async fn attachments(&self, task_id: Uuid) -> ClientResult<Vec<AttachmentSummary>> {
        let request = self.http.get(self.url(&format!("/attachments/task/{}", task_id)));
        let envelope: AttachmentsEnvelope = self.send(self.authed(request)?).await?;
        Ok(envelope.attachments)
    }

    pub async fn download_link(&self, attachment_id: Uuid) -> ClientResult<DownloadLink> {
        let request = self
            .http
            .get(self.url(&format!("/attachments/{}/download", attachment_id)));
        self.send(self.authed(request)?).await
    }

    /// Fetches a pre-signed link; no bearer token is sent to the store
    pub async fn fetch_download(&self, url: &str) -> ClientResult<Bytes> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("Download failed with status {}", status),
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Turns an error response into `ClientError::Api`, keeping the server's
/// `message` verbatim when there is one
async fn api_error(status: StatusCode, response: reqwest::Response) -> ClientError {
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    tracing::debug!(status = status.as_u16(), %message, "API request failed");

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
