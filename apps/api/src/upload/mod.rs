//! Upload admission: gate the file, store it, and track the upload job.
//!
//! `pending → uploading (20, validated) → uploading (60, storing) → success (100)`,
//! with `error` (progress 0) on a gate rejection or a storage failure.

pub mod gate;
pub mod handlers;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::jobs::{JobStatus, TrackerError, UploadDetails, UploadJob, UploadStatus, UploadTracker};
use crate::storage::{ArtifactStore, StorageError};
use gate::{Declared, GateRejection};

#[derive(Debug, Error)]
pub enum UploadFailure {
    #[error(transparent)]
    Rejected(#[from] GateRejection),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("upload {0} was deleted during admission")]
    Removed(Uuid),
}

impl From<TrackerError> for UploadFailure {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound(id) | TrackerError::PreconditionFailed { id, .. } => {
                UploadFailure::Removed(id)
            }
        }
    }
}

pub struct IncomingFile<'a> {
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub bytes: Bytes,
}

/// Runs one upload through the gate and into the artifact store. The job is
/// registered before anything is checked, so even rejected uploads can be polled.
pub async fn admit_upload(
    uploads: &UploadTracker,
    artifacts: &dyn ArtifactStore,
    file: IncomingFile<'_>,
    max_bytes: usize,
) -> Result<UploadJob, UploadFailure> {
    let upload_id = Uuid::new_v4();
    let size = file.bytes.len();
    uploads.create(
        upload_id,
        UploadDetails {
            filename: file.filename.to_string(),
            size_bytes: size,
            artifact: None,
            error_code: None,
        },
    );

    let declared = Declared {
        filename: file.filename,
        size: Some(size),
        content_type: file.content_type,
    };
    if let Err(rejection) = gate::validate(&file.bytes, declared, max_bytes) {
        warn!(%upload_id, filename = file.filename, code = rejection.code(), "Upload rejected: {rejection}");
        fail(uploads, upload_id, &rejection.to_string(), rejection.code())?;
        return Err(rejection.into());
    }
    uploads.update(upload_id, UploadStatus::Uploading, 20, "File validated")?;

    uploads.update(upload_id, UploadStatus::Uploading, 60, "Saving file")?;
    let artifact = match artifacts.store(upload_id, file.bytes).await {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!(%upload_id, "Failed to store upload: {e}");
            fail(uploads, upload_id, "Failed to save file", "storage_failed")?;
            return Err(e.into());
        }
    };

    let stored = uploads.modify(upload_id, |job| {
        job.status = UploadStatus::Success;
        job.progress = 100;
        job.message = UploadStatus::Success.default_message().to_string();
        job.details.artifact = Some(artifact);
    });
    let job = match stored {
        Ok(job) => job,
        Err(e) => {
            // Deleted while the bytes were in flight; nothing else will clean them up.
            warn!(%upload_id, "Upload deleted during storage, discarding artifact");
            if let Err(err) = artifacts.remove(upload_id).await {
                warn!(%upload_id, "Failed to discard artifact: {err}");
            }
            return Err(e.into());
        }
    };
    info!(%upload_id, filename = file.filename, size_bytes = size, "Upload stored");
    Ok(job)
}

fn fail(
    uploads: &UploadTracker,
    upload_id: Uuid,
    message: &str,
    code: &'static str,
) -> Result<(), TrackerError> {
    uploads.modify(upload_id, |job| {
        job.status = UploadStatus::Error;
        job.progress = 0;
        job.message = message.to_string();
        job.details.error_code = Some(code);
    })?;
    Ok(())
}
