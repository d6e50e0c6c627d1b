use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use super::{ArtifactRef, ArtifactStore, StorageError};
use crate::config::S3Settings;

const BACKEND: &str = "s3";
const KEY_PREFIX: &str = "uploads";

/// Stores artifacts as `uploads/{id}.pdf` objects in a single bucket (MinIO locally, AWS in production).
pub struct S3ArtifactStore {
    client: S3Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs a client configured for MinIO (local) or AWS (production).
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "resumesite-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        Self::new(aws_sdk_s3::Client::new(&s3_config), settings.bucket.clone())
    }

    fn key_for(id: Uuid) -> String {
        format!("{KEY_PREFIX}/{id}.pdf")
    }

    fn artifact_ref(id: Uuid, size_bytes: u64) -> ArtifactRef {
        ArtifactRef {
            id,
            backend: BACKEND,
            location: Self::key_for(id),
            size_bytes,
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn store(&self, id: Uuid, bytes: Bytes) -> Result<ArtifactRef, StorageError> {
        let size = bytes.len() as u64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(Self::key_for(id))
            .content_type("application/pdf")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Write {
                id,
                reason: e.to_string(),
            })?;

        info!(artifact_id = %id, bucket = %self.bucket, "Artifact uploaded to S3");
        Ok(Self::artifact_ref(id, size))
    }

    async fn resolve(&self, id: Uuid) -> Result<ArtifactRef, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(Self::key_for(id))
            .send()
            .await
        {
            Ok(head) => Ok(Self::artifact_ref(
                id,
                head.content_length().unwrap_or_default().max(0) as u64,
            )),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Err(StorageError::NotFound(id))
                } else {
                    Err(StorageError::Read {
                        id,
                        reason: service_err.to_string(),
                    })
                }
            }
        }
    }

    async fn load(&self, id: Uuid) -> Result<Bytes, StorageError> {
        let object = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(Self::key_for(id))
            .send()
            .await
        {
            Ok(object) => object,
            Err(e) => {
                let service_err = e.into_service_error();
                return if service_err.is_no_such_key() {
                    Err(StorageError::NotFound(id))
                } else {
                    Err(StorageError::Read {
                        id,
                        reason: service_err.to_string(),
                    })
                };
            }
        };

        let data = object.body.collect().await.map_err(|e| StorageError::Read {
            id,
            reason: e.to_string(),
        })?;
        Ok(data.into_bytes())
    }

    async fn remove(&self, id: Uuid) -> Result<(), StorageError> {
        // DeleteObject succeeds for missing keys, so check first to report NotFound.
        self.resolve(id).await?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(Self::key_for(id))
            .send()
            .await
            .map_err(|e| StorageError::Remove {
                id,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
