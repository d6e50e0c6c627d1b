use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::{UploadJob, UploadStatus};
use crate::state::AppState;
use crate::storage::StorageError;
use crate::upload::{admit_upload, IncomingFile};

#[derive(Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub size_bytes: usize,
    pub content_type: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub message: String,
    pub file_info: FileInfo,
}

#[derive(Serialize)]
pub struct UploadStatusResponse {
    pub upload_id: Uuid,
    pub status: UploadStatus,
    pub progress: u8,
    pub message: String,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl From<UploadJob> for UploadStatusResponse {
    fn from(job: UploadJob) -> Self {
        Self {
            upload_id: job.id,
            status: job.status,
            progress: job.progress,
            message: job.message,
            updated_at: job.updated_at,
            error_code: job.details.error_code,
        }
    }
}

#[derive(Serialize)]
pub struct UploadListResponse {
    pub total: usize,
    pub uploads: Vec<UploadJob>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// POST /api/upload
/// Expects the PDF in multipart field `file`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let job = admit_upload(
            &state.uploads,
            state.artifacts.as_ref(),
            IncomingFile {
                filename: &filename,
                content_type: content_type.as_deref(),
                bytes,
            },
            state.config.max_upload_bytes,
        )
        .await?;

        return Ok(Json(UploadResponse {
            upload_id: job.id,
            message: job.message,
            file_info: FileInfo {
                filename: job.details.filename,
                size_bytes: job.details.size_bytes,
                content_type: content_type.unwrap_or_else(|| "application/pdf".to_string()),
            },
        }));
    }

    Err(AppError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// GET /api/upload/:id/status
pub async fn handle_upload_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadStatusResponse>, AppError> {
    let job = state
        .uploads
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Upload {id} not found")))?;
    Ok(Json(job.into()))
}

/// DELETE /api/upload/:id
/// Removes the stored file and the tracker entry.
pub async fn handle_delete_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.uploads.get(id).is_none() {
        return Err(AppError::NotFound(format!("Upload {id} not found")));
    }
    match state.artifacts.remove(id).await {
        Ok(()) | Err(StorageError::NotFound(_)) => {}
        Err(e) => {
            warn!(upload_id = %id, "Failed to remove artifact: {e}");
            return Err(e.into());
        }
    }
    state.uploads.delete(id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/uploads
pub async fn handle_list_uploads(
    State(state): State<AppState>,
) -> Result<Json<UploadListResponse>, AppError> {
    let uploads = state.uploads.list();
    Ok(Json(UploadListResponse {
        total: uploads.len(),
        uploads,
    }))
}
