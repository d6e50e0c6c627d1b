use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::jobs::{JobStatus, ParseDetails, ParseJob, ParseResult, ParseStatus, UploadStatus};
use crate::models::resume::{validate_record, ResumeDraft, ResumeRecord};
use crate::pipeline::error::{PipelineError, RunAbort};
use crate::pipeline::{ParseHandle, ParsePipeline};
use crate::resume::completeness::compute_completeness_report;
use crate::storage::StorageError;

/// Top-level sections the structured payload must carry.
const REQUIRED_SECTIONS: &[&str] = &["personal_info", "work_experience", "education", "skills"];

/// Why a parse job could not be created.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Upload {0} not found")]
    UploadNotFound(Uuid),

    #[error("Upload {id} is {status}; only successful uploads can be parsed")]
    UploadNotReady { id: Uuid, status: &'static str },

    #[error("Uploaded file for {0} is no longer available")]
    ArtifactMissing(Uuid),

    #[error(transparent)]
    Storage(StorageError),
}

impl ParsePipeline {
    /// Creates a parse job for a successful upload and starts it in the background.
    pub async fn submit(self: &Arc<Self>, upload_id: Uuid) -> Result<ParseHandle, AdmissionError> {
        let upload = self
            .uploads
            .get(upload_id)
            .ok_or(AdmissionError::UploadNotFound(upload_id))?;
        if upload.status != UploadStatus::Success {
            return Err(AdmissionError::UploadNotReady {
                id: upload_id,
                status: upload.status.as_str(),
            });
        }
        match self.artifacts.resolve(upload_id).await {
            Ok(_) => {}
            Err(StorageError::NotFound(_)) => return Err(AdmissionError::ArtifactMissing(upload_id)),
            Err(e) => return Err(AdmissionError::Storage(e)),
        }

        let job_id = Uuid::new_v4();
        self.jobs.create(job_id, ParseDetails::new(upload_id));
        info!(%job_id, %upload_id, "Parse job created");

        Ok(self.spawn_run(job_id))
    }

    pub(super) fn spawn_run(self: &Arc<Self>, job_id: Uuid) -> ParseHandle {
        let pipeline = Arc::clone(self);
        let task = tokio::spawn(async move { pipeline.run(job_id).await });
        ParseHandle { job_id, task }
    }

    /// One attempt at the whole stage sequence. Always leaves the job terminal
    /// unless the job was deleted underneath it.
    async fn run(&self, job_id: Uuid) -> Option<ParseJob> {
        let outcome = AssertUnwindSafe(self.execute(job_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let cause = panic_message(panic.as_ref());
                error!(%job_id, "Parse pipeline component panicked: {cause}");
                Err(RunAbort::Failed(PipelineError::Internal(format!(
                    "a pipeline component panicked: {cause}"
                ))))
            });

        match outcome {
            Ok(job) => Some(job),
            Err(RunAbort::JobRemoved) => {
                info!(%job_id, "Parse job deleted while running, abandoning run");
                None
            }
            Err(RunAbort::Failed(err)) => {
                let kind = err.kind();
                warn!(%job_id, error_code = kind.as_str(), "Parse job failed: {err}");
                self.jobs
                    .modify(job_id, |job| {
                        job.status = ParseStatus::Error;
                        job.progress = 0;
                        job.message = err.to_string();
                        job.details.result = None;
                        job.details.failure = Some(kind);
                    })
                    .ok()
            }
        }
    }

    async fn execute(&self, job_id: Uuid) -> Result<ParseJob, RunAbort> {
        let job = self
            .jobs
            .modify(job_id, |job| job.details.attempts += 1)
            .map_err(|_| RunAbort::JobRemoved)?;
        let upload_ref = job.details.upload_ref;
        let checkpoints = self.settings.checkpoints;
        debug!(%job_id, %upload_ref, attempt = job.details.attempts, "Parse run started");

        let pdf = self.load_artifact(upload_ref).await?;

        self.advance(job_id, ParseStatus::Extracting, checkpoints.extracting)?;
        let text = self.extract(pdf).await?;

        self.advance(job_id, ParseStatus::Structuring, checkpoints.structuring)?;
        let payload = self.structure(&text).await?;

        self.advance(job_id, ParseStatus::Validating, checkpoints.validating)?;
        let record = validate_payload(payload)?;

        self.advance(job_id, ParseStatus::Persisting, checkpoints.persisting)?;
        let record_id = self.persist(&record).await?;

        let completeness = compute_completeness_report(&record);
        let done = self
            .jobs
            .modify(job_id, |job| {
                job.status = ParseStatus::Success;
                job.progress = checkpoints.success;
                job.message = ParseStatus::Success.default_message().to_string();
                job.details.failure = None;
                job.details.result = Some(ParseResult {
                    record_id,
                    record,
                    completeness,
                });
            })
            .map_err(|_| RunAbort::JobRemoved)?;

        info!(%job_id, %record_id, "Parse job succeeded");
        Ok(done)
    }

    fn advance(&self, job_id: Uuid, status: ParseStatus, progress: u8) -> Result<(), RunAbort> {
        self.jobs
            .update(job_id, status, progress, status.default_message())
            .map_err(|_| RunAbort::JobRemoved)?;
        debug!(%job_id, stage = status.as_str(), progress, "Parse stage entered");
        Ok(())
    }

    // ── stages ──────────────────────────────────────────────────────────────

    async fn load_artifact(&self, upload_ref: Uuid) -> Result<Bytes, PipelineError> {
        self.artifacts.load(upload_ref).await.map_err(|e| match e {
            StorageError::NotFound(id) => PipelineError::ArtifactMissing(id),
            other => PipelineError::Internal(other.to_string()),
        })
    }

    async fn extract(&self, pdf: Bytes) -> Result<String, PipelineError> {
        let text = self.extractor.extract_text(pdf).await?;
        let found = text.trim().chars().count();
        let required = self.settings.min_text_chars;
        if found < required {
            return Err(PipelineError::InsufficientText { found, required });
        }
        Ok(text)
    }

    async fn structure(&self, text: &str) -> Result<Value, PipelineError> {
        let payload = self.structurer.structure(text).await?;
        check_required_sections(&payload)?;
        Ok(payload)
    }

    async fn persist(&self, record: &ResumeRecord) -> Result<Uuid, PipelineError> {
        let stored_id = self.records.save(record).await?;
        if stored_id.is_nil() || stored_id != record.id {
            return Err(PipelineError::Persistence(format!(
                "store returned id {stored_id} for record {}",
                record.id
            )));
        }
        Ok(stored_id)
    }
}

fn check_required_sections(payload: &Value) -> Result<(), PipelineError> {
    let Some(obj) = payload.as_object().filter(|o| !o.is_empty()) else {
        return Err(PipelineError::Structuring(
            "structurer returned an empty result".to_string(),
        ));
    };
    let missing: Vec<&str> = REQUIRED_SECTIONS
        .iter()
        .copied()
        .filter(|key| obj.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Structuring(format!(
            "result is missing required sections: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn validate_payload(payload: Value) -> Result<ResumeRecord, PipelineError> {
    let draft: ResumeDraft = serde_json::from_value(payload)
        .map_err(|e| PipelineError::SchemaValidation(e.to_string()))?;
    let now = Utc::now();
    let record = draft.into_record(Uuid::new_v4(), now);

    let violations = validate_record(&record);
    if !violations.is_empty() {
        let detail = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PipelineError::SchemaValidation(detail));
    }
    Ok(record)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
