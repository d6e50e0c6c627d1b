use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::resume::ResumeRecord;
use crate::pipeline::error::FailureKind;
use crate::resume::completeness::CompletenessReport;
use crate::storage::ArtifactRef;

/// Status enum of one job family.
pub trait JobStatus: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    const INITIAL: Self;

    fn is_terminal(self) -> bool;

    fn as_str(self) -> &'static str;

    fn default_message(self) -> &'static str;
}

/// One tracked job. `details` carries the family-specific fields and is
/// flattened into the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord<S, D> {
    pub id: Uuid,
    pub status: S,
    pub progress: u8,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: D,
}

impl<S: JobStatus, D> JobRecord<S, D> {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Upload jobs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl JobStatus for UploadStatus {
    const INITIAL: Self = UploadStatus::Pending;

    fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }

    fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            UploadStatus::Pending => "Upload received",
            UploadStatus::Uploading => "Uploading file",
            UploadStatus::Success => "File uploaded successfully",
            UploadStatus::Error => "Upload failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadDetails {
    pub filename: String,
    pub size_bytes: usize,
    /// Set only once the bytes are stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

pub type UploadJob = JobRecord<UploadStatus, UploadDetails>;

// ────────────────────────────────────────────────────────────────────────────
// Parse jobs
// ────────────────────────────────────────────────────────────────────────────

/// Pipeline stages, in order. `Error` is reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Pending,
    Extracting,
    Structuring,
    Validating,
    Persisting,
    Success,
    Error,
}

impl JobStatus for ParseStatus {
    const INITIAL: Self = ParseStatus::Pending;

    fn is_terminal(self) -> bool {
        matches!(self, ParseStatus::Success | ParseStatus::Error)
    }

    fn as_str(self) -> &'static str {
        match self {
            ParseStatus::Pending => "pending",
            ParseStatus::Extracting => "extracting",
            ParseStatus::Structuring => "structuring",
            ParseStatus::Validating => "validating",
            ParseStatus::Persisting => "persisting",
            ParseStatus::Success => "success",
            ParseStatus::Error => "error",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            ParseStatus::Pending => "Parse job created, waiting to start",
            ParseStatus::Extracting => "Extracting text from PDF",
            ParseStatus::Structuring => "Structuring résumé content with AI",
            ParseStatus::Validating => "Validating structured data",
            ParseStatus::Persisting => "Saving résumé data",
            ParseStatus::Success => "Résumé parsed successfully",
            ParseStatus::Error => "Résumé parsing failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub record_id: Uuid,
    pub record: ResumeRecord,
    pub completeness: CompletenessReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseDetails {
    /// The upload whose artifact this job consumes.
    pub upload_ref: Uuid,
    /// Orchestrator invocations so far, including retries.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ParseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ParseDetails {
    pub fn new(upload_ref: Uuid) -> Self {
        Self {
            upload_ref,
            attempts: 0,
            result: None,
            failure: None,
        }
    }
}

pub type ParseJob = JobRecord<ParseStatus, ParseDetails>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(ParseStatus::Success.is_terminal());
        assert!(ParseStatus::Error.is_terminal());
        assert!(!ParseStatus::Persisting.is_terminal());
        assert!(UploadStatus::Error.is_terminal());
        assert!(!UploadStatus::Uploading.is_terminal());
    }

    #[test]
    fn test_stage_order() {
        assert!(ParseStatus::Pending < ParseStatus::Extracting);
        assert!(ParseStatus::Extracting < ParseStatus::Structuring);
        assert!(ParseStatus::Validating < ParseStatus::Persisting);
        assert!(ParseStatus::Persisting < ParseStatus::Success);
    }

    #[test]
    fn test_serialized_status_matches_as_str() {
        for s in [
            ParseStatus::Pending,
            ParseStatus::Structuring,
            ParseStatus::Success,
            ParseStatus::Error,
        ] {
            assert_eq!(serde_json::to_value(s).unwrap(), s.as_str());
        }
        assert_eq!(
            serde_json::to_value(UploadStatus::Uploading).unwrap(),
            "uploading"
        );
    }
}
