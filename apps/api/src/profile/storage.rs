use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

/// Object key for a newly uploaded resume.
pub fn resume_key(user_id: Uuid) -> String {
    format!("resumes/{}/{}.pdf", user_id, Uuid::new_v4())
}

/// Blob storage for original resume PDFs, kept so they can be re-parsed later.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Stores a new resume under a fresh key and returns the key.
    async fn store(&self, user_id: Uuid, bytes: Vec<u8>) -> Result<String, AppError>;

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, AppError>;

    /// Best effort: failures are logged, not returned.
    async fn delete(&self, key: &str);
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3ResumeStorage {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ResumeStorage {
    pub fn new(s3: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ResumeStorage for S3ResumeStorage {
    async fn store(&self, user_id: Uuid, bytes: Vec<u8>) -> Result<String, AppError> {
        let key = resume_key(user_id);
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| AppError::S3(format!("resume upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let object = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("resume download failed: {e}")))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::Internal(anyhow!("reading resume body failed: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self
            .s3
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            warn!("Failed to delete resume s3://{}/{}: {e}", self.bucket, key);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryResumeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryResumeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently held, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ResumeStorage for InMemoryResumeStorage {
    async fn store(&self, user_id: Uuid, bytes: Vec<u8>) -> Result<String, AppError> {
        let key = resume_key(user_id);
        self.objects.lock().await.insert(key.clone(), bytes);
        Ok(key)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, AppError> {
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Resume {key} not found")))
    }

    async fn delete(&self, key: &str) {
        self.objects.lock().await.remove(key);
    }
}
