//! Artifact storage: save bytes under an opaque id and fetch them back by id.
//!
//! Uploaded PDFs are written here by the upload handler and read back by the
//! parse pipeline. `AppState` holds an `Arc<dyn ArtifactStore>` chosen at startup
//! from `ARTIFACT_BACKEND`.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod filesystem;
pub mod memory;
pub mod s3;

pub use filesystem::FsArtifactStore;
pub use memory::MemoryArtifactStore;
pub use s3::S3ArtifactStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact {0} not found")]
    NotFound(Uuid),

    #[error("failed to write artifact {id}: {reason}")]
    Write { id: Uuid, reason: String },

    #[error("failed to read artifact {id}: {reason}")]
    Read { id: Uuid, reason: String },

    #[error("failed to remove artifact {id}: {reason}")]
    Remove { id: Uuid, reason: String },
}

/// Where a stored artifact lives. `location` is a path or an object key depending
/// on the backend and is only meaningful to that backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    pub id: Uuid,
    pub backend: &'static str,
    pub location: String,
    pub size_bytes: u64,
}

/// No transactional guarantee beyond "write completed or returned an error";
/// a reference obtained before a failed `store` must not be trusted.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn store(&self, id: Uuid, bytes: Bytes) -> Result<ArtifactRef, StorageError>;

    /// Fails with `StorageError::NotFound` once the artifact is gone.
    async fn resolve(&self, id: Uuid) -> Result<ArtifactRef, StorageError>;

    async fn load(&self, id: Uuid) -> Result<Bytes, StorageError>;

    async fn remove(&self, id: Uuid) -> Result<(), StorageError>;
}
