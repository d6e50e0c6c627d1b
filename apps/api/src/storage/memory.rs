use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::{ArtifactRef, ArtifactStore, StorageError};

const BACKEND: &str = "memory";

/// Process-local artifact store. Used by tests and `ARTIFACT_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryArtifactStore {
    blobs: RwLock<HashMap<Uuid, Bytes>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn artifact_ref(id: Uuid, size_bytes: usize) -> ArtifactRef {
        ArtifactRef {
            id,
            backend: BACKEND,
            location: format!("memory://{id}"),
            size_bytes: size_bytes as u64,
        }
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn store(&self, id: Uuid, bytes: Bytes) -> Result<ArtifactRef, StorageError> {
        let size = bytes.len();
        self.blobs
            .write()
            .map_err(|e| StorageError::Write {
                id,
                reason: e.to_string(),
            })?
            .insert(id, bytes);
        Ok(Self::artifact_ref(id, size))
    }

    async fn resolve(&self, id: Uuid) -> Result<ArtifactRef, StorageError> {
        let blobs = self.blobs.read().map_err(|e| StorageError::Read {
            id,
            reason: e.to_string(),
        })?;
        blobs
            .get(&id)
            .map(|b| Self::artifact_ref(id, b.len()))
            .ok_or(StorageError::NotFound(id))
    }

    async fn load(&self, id: Uuid) -> Result<Bytes, StorageError> {
        let blobs = self.blobs.read().map_err(|e| StorageError::Read {
            id,
            reason: e.to_string(),
        })?;
        blobs.get(&id).cloned().ok_or(StorageError::NotFound(id))
    }

    async fn remove(&self, id: Uuid) -> Result<(), StorageError> {
        self.blobs
            .write()
            .map_err(|e| StorageError::Remove {
                id,
                reason: e.to_string(),
            })?
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }
}
