use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::{ParseJob, ParseStatus};
use crate::models::resume::ResumeRecord;
use crate::resume::completeness::CompletenessReport;
use crate::state::AppState;

fn status_url(parse_id: Uuid) -> String {
    format!("/api/parse/{parse_id}/status")
}

#[derive(Serialize)]
pub struct ParseStartedResponse {
    pub parse_id: Uuid,
    pub upload_id: Uuid,
    pub message: String,
    pub status_url: String,
}

#[derive(Serialize)]
pub struct RetryResponse {
    pub parse_id: Uuid,
    pub message: String,
    pub status_url: String,
}

/// Poll view of one parse job. The result fields appear only once it succeeded.
#[derive(Serialize)]
pub struct ParseStatusResponse {
    pub parse_id: Uuid,
    pub upload_id: Uuid,
    pub status: ParseStatus,
    pub progress: u8,
    pub message: String,
    pub updated_at: DateTime<Utc>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_data: Option<ResumeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completeness: Option<CompletenessReport>,
}

impl From<ParseJob> for ParseStatusResponse {
    fn from(job: ParseJob) -> Self {
        let (resume_id, resume_data, completeness) = match job.details.result {
            Some(result) => (
                Some(result.record_id),
                Some(result.record),
                Some(result.completeness),
            ),
            None => (None, None, None),
        };
        Self {
            parse_id: job.id,
            upload_id: job.details.upload_ref,
            status: job.status,
            progress: job.progress,
            message: job.message,
            updated_at: job.updated_at,
            attempts: job.details.attempts,
            error_code: job.details.failure.map(|kind| kind.as_str()),
            resume_id,
            resume_data,
            completeness,
        }
    }
}

#[derive(Serialize)]
pub struct ParseListResponse {
    pub total: usize,
    pub tasks: Vec<ParseJob>,
}

/// POST /api/parse/:upload_id
/// Starts a background parse of a successful upload.
pub async fn handle_start_parse(
    State(state): State<AppState>,
    Path(upload_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ParseStartedResponse>), AppError> {
    let handle = state.pipeline.submit(upload_id).await?;
    let parse_id = handle.job_id;
    Ok((
        StatusCode::ACCEPTED,
        Json(ParseStartedResponse {
            parse_id,
            upload_id,
            message: "Parse job started".to_string(),
            status_url: status_url(parse_id),
        }),
    ))
}

/// GET /api/parse/:id/status
pub async fn handle_parse_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParseStatusResponse>, AppError> {
    let job = state
        .pipeline
        .jobs()
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Parse job {id} not found")))?;
    Ok(Json(job.into()))
}

/// POST /api/parse/:id/retry
pub async fn handle_retry_parse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RetryResponse>), AppError> {
    let handle = state.pipeline.retry(id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(RetryResponse {
            parse_id: handle.job_id,
            message: "Parse job retry started".to_string(),
            status_url: status_url(handle.job_id),
        }),
    ))
}

/// DELETE /api/parse/:id
/// Drops the tracker entry only; the upload and any persisted record stay.
pub async fn handle_delete_parse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .pipeline
        .jobs()
        .delete(id)
        .ok_or_else(|| AppError::NotFound(format!("Parse job {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/parses
pub async fn handle_list_parses(
    State(state): State<AppState>,
) -> Result<Json<ParseListResponse>, AppError> {
    let tasks = state.pipeline.jobs().list();
    Ok(Json(ParseListResponse {
        total: tasks.len(),
        tasks,
    }))
}
