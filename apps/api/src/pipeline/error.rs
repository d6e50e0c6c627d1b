use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::extract::ExtractionError;
use crate::resume::store::StoreError;
use crate::structuring::StructuringError;

/// Why a parse run ended in `Error`. Every stage returns one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Uploaded file {0} is no longer available")]
    ArtifactMissing(Uuid),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Extracted text is too short to be a résumé ({found} characters, need at least {required})")]
    InsufficientText { found: usize, required: usize },

    #[error("AI structuring failed: {0}")]
    Structuring(String),

    #[error("Structured data failed validation: {0}")]
    SchemaValidation(String),

    #[error("Failed to save résumé data: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable failure code exposed as `error_code` in the parse status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ArtifactMissing,
    ExtractionFailed,
    StructuringFailed,
    SchemaValidationFailed,
    PersistenceFailed,
    Internal,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::ArtifactMissing => "artifact_missing",
            FailureKind::ExtractionFailed => "extraction_failed",
            FailureKind::StructuringFailed => "structuring_failed",
            FailureKind::SchemaValidationFailed => "schema_validation_failed",
            FailureKind::PersistenceFailed => "persistence_failed",
            FailureKind::Internal => "internal",
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::ArtifactMissing(_) => FailureKind::ArtifactMissing,
            PipelineError::Extraction(_) | PipelineError::InsufficientText { .. } => {
                FailureKind::ExtractionFailed
            }
            PipelineError::Structuring(_) => FailureKind::StructuringFailed,
            PipelineError::SchemaValidation(_) => FailureKind::SchemaValidationFailed,
            PipelineError::Persistence(_) => FailureKind::PersistenceFailed,
            PipelineError::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(err: ExtractionError) -> Self {
        PipelineError::Extraction(err.to_string())
    }
}

impl From<StructuringError> for PipelineError {
    fn from(err: StructuringError) -> Self {
        PipelineError::Structuring(err.to_string())
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

/// How a run stopped short of `Success`.
#[derive(Debug)]
pub(crate) enum RunAbort {
    Failed(PipelineError),
    /// The job was deleted while running; nothing left to report to.
    JobRemoved,
}

impl From<PipelineError> for RunAbort {
    fn from(err: PipelineError) -> Self {
        RunAbort::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_counts_as_extraction_failure() {
        let err = PipelineError::InsufficientText {
            found: 3,
            required: 50,
        };
        assert_eq!(err.kind(), FailureKind::ExtractionFailed);
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_failure_kind_serializes_as_code() {
        for kind in [
            FailureKind::ArtifactMissing,
            FailureKind::SchemaValidationFailed,
            FailureKind::Internal,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}
