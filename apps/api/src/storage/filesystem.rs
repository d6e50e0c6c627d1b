use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ArtifactRef, ArtifactStore, StorageError};

const BACKEND: &str = "fs";

/// Stores each artifact as `{root}/{id}.pdf`.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.pdf"))
    }

    fn artifact_ref(&self, id: Uuid, size_bytes: u64) -> ArtifactRef {
        ArtifactRef {
            id,
            backend: BACKEND,
            location: self.path_for(id).display().to_string(),
            size_bytes,
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn store(&self, id: Uuid, bytes: Bytes) -> Result<ArtifactRef, StorageError> {
        let write_err = |e: std::io::Error| StorageError::Write {
            id,
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(write_err)?;

        // Write to a sibling file first so a crash never leaves a truncated `{id}.pdf`.
        let final_path = self.path_for(id);
        let part_path = final_path.with_extension("pdf.part");
        tokio::fs::write(&part_path, &bytes).await.map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&part_path, &final_path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&part_path).await {
                warn!(artifact_id = %id, "Failed to remove {}: {cleanup}", part_path.display());
            }
            return Err(write_err(e));
        }

        info!(artifact_id = %id, path = %final_path.display(), "Artifact stored");
        Ok(self.artifact_ref(id, bytes.len() as u64))
    }

    async fn resolve(&self, id: Uuid) -> Result<ArtifactRef, StorageError> {
        match tokio::fs::metadata(self.path_for(id)).await {
            Ok(meta) if meta.is_file() => Ok(self.artifact_ref(id, meta.len())),
            Ok(_) => Err(StorageError::NotFound(id)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id)),
            Err(e) => Err(StorageError::Read {
                id,
                reason: e.to_string(),
            }),
        }
    }

    async fn load(&self, id: Uuid) -> Result<Bytes, StorageError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id)),
            Err(e) => Err(StorageError::Read {
                id,
                reason: e.to_string(),
            }),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => {
                debug!(artifact_id = %id, "Artifact removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id)),
            Err(e) => Err(StorageError::Remove {
                id,
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_resolve_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("uploads"));
        let id = Uuid::new_v4();

        let stored = store
            .store(id, Bytes::from_static(b"%PDF-1.4 test"))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 13);
        assert!(stored.location.ends_with(&format!("{id}.pdf")));

        let resolved = store.resolve(id).await.unwrap();
        assert_eq!(resolved, stored);
        assert_eq!(&store.load(id).await.unwrap()[..], b"%PDF-1.4 test");

        store.remove(id).await.unwrap();
        assert!(matches!(store.resolve(id).await, Err(StorageError::NotFound(_))));
        assert!(matches!(store.load(id).await, Err(StorageError::NotFound(_))));
        assert!(matches!(store.remove(id).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_part_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let id = Uuid::new_v4();
        store.store(id, Bytes::from_static(b"%PDF-")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{id}.pdf")]);
    }

    #[tokio::test]
    async fn test_failed_rename_cleans_up_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let id = Uuid::new_v4();

        // A non-empty directory squatting on the final name makes the rename fail.
        let squatter = dir.path().join(format!("{id}.pdf"));
        std::fs::create_dir(&squatter).unwrap();
        std::fs::write(squatter.join("keep"), b"x").unwrap();

        let err = store.store(id, Bytes::from_static(b"%PDF-")).await.unwrap_err();
        assert!(matches!(err, StorageError::Write { id: failed, .. } if failed == id));
        assert!(!dir.path().join(format!("{id}.pdf.part")).exists());
        assert!(squatter.join("keep").exists());
    }
}
