/// Attachment endpoints
///
/// Bytes live only in object storage; the database keeps the storage key.
///
/// # Endpoints
///
/// - `POST /attachments` - Multipart upload (`file` + `taskId`), 10 MB cap
/// - `GET /attachments/task/:task_id` - List a task's attachments
/// - `GET /attachments/:id/download` - Pre-signed download link (300 s)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppMultipart, AppPath},
    routes::{delete_objects_best_effort, parse_id},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension,
};
use bytes::Bytes;
use serde::Serialize;
use taskdeck_shared::{
    auth::{
        access::{authorize, Resource, ResourceKind},
        middleware::AuthContext,
    },
    models::attachment::{Attachment, AttachmentSummary, CreateAttachment},
    storage::{attachment_key, DOWNLOAD_URL_TTL, MAX_UPLOAD_BYTES},
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub attachment: Attachment,
}

#[derive(Debug, Serialize)]
pub struct AttachmentsResponse {
    pub attachments: Vec<AttachmentSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_url: String,

    /// Link lifetime in seconds
    pub expires_in: u64,
}

/// The `file` part of an upload
#[derive(Debug)]
struct UploadedFile {
    file_name: String,
    content_type: String,
    body: Bytes,
}

/// Parts collected from the multipart body
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    task_id: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    let file_name = field
                        .file_name()
                        .map(str::to_string)
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| "file".to_string());
                    let content_type = field
                        .content_type()
                        .unwrap_or(DEFAULT_CONTENT_TYPE)
                        .to_string();
                    let body = field.bytes().await?;
                    check_size(body.len())?;

                    form.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        body,
                    });
                }
                Some("taskId") => {
                    form.task_id = Some(field.text().await?.trim().to_string());
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Both parts, or a 400 naming the missing ones
    fn require(self) -> ApiResult<(UploadedFile, String)> {
        let task_id = self.task_id.filter(|id| !id.is_empty());

        match (self.file, task_id) {
            (Some(file), Some(task_id)) => Ok((file, task_id)),
            (file, task_id) => {
                let mut missing = Vec::new();
                if file.is_none() {
                    missing.push("file");
                }
                if task_id.is_none() {
                    missing.push("taskId");
                }
                Err(ApiError::missing_fields(&missing))
            }
        }
    }
}

fn check_size(len: usize) -> ApiResult<()> {
    if len > MAX_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge(
            "File exceeds the 10 MB upload limit".to_string(),
        ));
    }
    Ok(())
}

/// Uploads a file for a task
///
/// The object is written to storage before the attachment row is created.
///
/// # Errors
///
/// - `400`: `file` or `taskId` missing, malformed multipart body
/// - `404`: Task doesn't exist
/// - `403`: Caller isn't a member of the task's workspace
/// - `413`: File larger than 10 MB
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppMultipart(multipart): AppMultipart,
) -> ApiResult<(StatusCode, AppJson<UploadResponse>)> {
    let (file, task_id) = UploadForm::read(multipart).await?.require()?;
    let task_id = parse_id(&task_id, ResourceKind::Task)?;

    authorize(&state.db, auth.user_id, Resource::Task(task_id)).await?;

    let key = attachment_key(task_id, &file.file_name);
    let size_bytes = file.body.len() as i64;

    state
        .storage
        .put_object(&key, file.body, &file.content_type)
        .await?;

    let created = Attachment::create(
        &state.db,
        CreateAttachment {
            file_name: file.file_name,
            file_url: key.clone(),
            content_type: file.content_type,
            size_bytes,
            task_id,
        },
    )
    .await;

    let attachment = match created {
        Ok(attachment) => attachment,
        Err(e) => {
            delete_objects_best_effort(state.storage.clone(), vec![key]).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        user_id = %auth.user_id,
        %task_id,
        attachment_id = %attachment.id,
        size_bytes,
        "Attachment uploaded"
    );

    Ok((
        StatusCode::CREATED,
        AppJson(UploadResponse {
            message: "File uploaded successfully".to_string(),
            attachment,
        }),
    ))
}

/// Lists a task's attachments, newest first
pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<String>,
) -> ApiResult<AppJson<AttachmentsResponse>> {
    let task_id = parse_id(&task_id, ResourceKind::Task)?;
    authorize(&state.db, auth.user_id, Resource::Task(task_id)).await?;

    let attachments = Attachment::list_by_task(&state.db, task_id).await?;

    Ok(AppJson(AttachmentsResponse { attachments }))
}

/// Issues a short-lived download link; bytes are never proxied
pub async fn download_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<String>,
) -> ApiResult<AppJson<DownloadResponse>> {
    let id = parse_id(&id, ResourceKind::Attachment)?;
    authorize(&state.db, auth.user_id, Resource::Attachment(id)).await?;

    let attachment = Attachment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    let download_url = state
        .storage
        .presigned_get_url(&attachment.file_url, DOWNLOAD_URL_TTL)
        .await?;

    Ok(AppJson(DownloadResponse {
        download_url,
        expires_in: DOWNLOAD_URL_TTL.as_secs(),
    }))
}
