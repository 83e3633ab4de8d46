//! Caption blob store seam.
//!
//! The pipeline writes the raw caption text of every processed video once,
//! keyed by video id. Writes are best effort and never block a response.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::client::S3Client;
use crate::error::{StorageError, StorageResult};

/// Content type of stored caption files.
pub const CAPTION_CONTENT_TYPE: &str = "text/plain";

/// Object key for a video's caption file.
///
/// Format: `{video_id}-caption.txt`
pub fn caption_key(video_id: &str) -> String {
    format!("{}-caption.txt", video_id)
}

/// Write-only store for raw caption files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `caption` under [`caption_key`] and return the key.
    async fn put_caption(&self, video_id: &str, caption: &str) -> StorageResult<String>;

    /// Reachability check used by the readiness endpoint.
    async fn check_ready(&self) -> StorageResult<()>;
}

#[async_trait]
impl BlobStore for S3Client {
    async fn put_caption(&self, video_id: &str, caption: &str) -> StorageResult<String> {
        let key = caption_key(video_id);
        self.upload_text(caption, &key, CAPTION_CONTENT_TYPE).await?;
        debug!(key = %key, bucket = %self.bucket(), "Stored caption");
        Ok(key)
    }

    async fn check_ready(&self) -> StorageResult<()> {
        self.check_connectivity().await
    }
}

/// An object held by [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: String,
    pub content_type: String,
}

/// In-memory [`BlobStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    fail_with: Option<String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes and readiness checks always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_caption(&self, video_id: &str, caption: &str) -> StorageResult<String> {
        if let Some(message) = &self.fail_with {
            return Err(StorageError::upload_failed(message.clone()));
        }
        let key = caption_key(video_id);
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.clone(),
                StoredObject {
                    body: caption.to_string(),
                    content_type: CAPTION_CONTENT_TYPE.to_string(),
                },
            );
        Ok(key)
    }

    async fn check_ready(&self) -> StorageResult<()> {
        match &self.fail_with {
            Some(message) => Err(StorageError::AwsSdk(message.clone())),
            None => Ok(()),
        }
    }
}
