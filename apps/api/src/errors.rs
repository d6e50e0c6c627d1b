use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::{AdmissionError, RetryRejection};
use crate::render::RenderError;
use crate::resume::store::StoreError;
use crate::storage::StorageError;
use crate::upload::gate::GateRejection;
use crate::upload::UploadFailure;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The target exists but is in the wrong state for the request.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record store error: {0}")]
    RecordStore(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GateRejection> for AppError {
    fn from(rejection: GateRejection) -> Self {
        match rejection {
            GateRejection::SizeExceeded { .. } => AppError::PayloadTooLarge(rejection.to_string()),
            _ => AppError::Validation(rejection.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => AppError::NotFound(format!("Artifact {id} not found")),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::RecordStore(err.to_string())
    }
}

impl From<UploadFailure> for AppError {
    fn from(err: UploadFailure) -> Self {
        match err {
            UploadFailure::Rejected(rejection) => rejection.into(),
            UploadFailure::Storage(e) => AppError::Storage(e.to_string()),
            UploadFailure::Removed(id) => AppError::NotFound(format!("Upload {id} not found")),
        }
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::UploadNotFound(_) | AdmissionError::ArtifactMissing(_) => {
                AppError::NotFound(err.to_string())
            }
            AdmissionError::UploadNotReady { .. } => AppError::Precondition(err.to_string()),
            AdmissionError::Storage(e) => e.into(),
        }
    }
}

impl From<RetryRejection> for AppError {
    fn from(err: RetryRejection) -> Self {
        match err {
            RetryRejection::NotRetryable { .. } => AppError::Precondition(err.to_string()),
            RetryRejection::Storage { .. } => AppError::Storage(err.to_string()),
            _ => AppError::NotFound(err.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownTemplate(_) | RenderError::InvalidColor { .. } => {
                AppError::Validation(err.to_string())
            }
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::Precondition(msg) => (
                StatusCode::BAD_REQUEST,
                "PRECONDITION_FAILED",
                msg.clone(),
            ),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "File storage failed, please retry".to_string(),
                )
            }
            AppError::RecordStore(msg) => {
                tracing::error!("Record store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RECORD_STORE_ERROR",
                    "A data store error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_gate_rejections_map_to_client_errors() {
        assert_eq!(
            status_of(GateRejection::SizeExceeded { actual: 11, max: 10 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(status_of(GateRejection::BadMagicHeader), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_admission_and_retry_statuses() {
        let id = Uuid::new_v4();
        assert_eq!(status_of(AdmissionError::UploadNotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AdmissionError::ArtifactMissing(id)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AdmissionError::UploadNotReady { id, status: "error" }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(RetryRejection::NotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(RetryRejection::NotRetryable { id, status: "success" }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RetryRejection::Storage {
                upload_id: id,
                reason: "connection reset".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unknown_template_is_a_validation_error() {
        assert_eq!(
            status_of(RenderError::UnknownTemplate("neon".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
