//! Blob storage for record images.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use flora_core::{ImageRef, RecordId, StoreError, Timestamp};
use tokio::sync::RwLock;

use crate::images::{compress_jpeg, decode_data_url};

/// Object storage for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path` and return the URL it can be fetched from.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError>;
}

/// Storage path for the `index`-th image of a record uploaded at `at`.
pub fn image_upload_path(record_id: &RecordId, index: usize, at: Timestamp) -> String {
    format!(
        "flowers/{}/image_{}_{}.jpg",
        record_id,
        index,
        at.timestamp_millis()
    )
}

/// Upload every inline image of a record and return the resolved list.
///
/// Resolved URLs pass through unchanged, so re-saving a record with the same
/// images uploads nothing. Inline images are compressed to JPEG first; an
/// image that cannot be decoded for compression is uploaded as-is.
pub async fn upload_images(
    blobs: &dyn BlobStore,
    record_id: &RecordId,
    images: Vec<ImageRef>,
    now: Timestamp,
) -> Result<Vec<ImageRef>, StoreError> {
    let mut resolved = Vec::with_capacity(images.len());
    for (index, image) in images.into_iter().enumerate() {
        let data_url = match image {
            ImageRef::Url(url) => {
                resolved.push(ImageRef::Url(url));
                continue;
            }
            ImageRef::Inline(data_url) => data_url,
        };

        let path = image_upload_path(record_id, index, now);
        let decoded = decode_data_url(&data_url).map_err(|e| StoreError::UploadFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let bytes = match compress_jpeg(&decoded.bytes) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "image compression failed, uploading original bytes");
                decoded.bytes
            }
        };

        let url = blobs.put(&path, bytes, "image/jpeg").await?;
        tracing::debug!(record_id = %record_id, path = %path, "image uploaded");
        resolved.push(ImageRef::Url(url));
    }
    Ok(resolved)
}

/// In-memory [`BlobStore`] returning `memory://<path>` URLs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, (String, Vec<u8>)>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Bytes stored at `path`.
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(path).map(|(_, bytes)| bytes.clone())
    }

    /// Paths of every stored blob, sorted.
    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::UploadFailed {
                path: path.to_string(),
                reason: "blob storage unavailable".to_string(),
            });
        }
        self.blobs
            .write()
            .await
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("memory://{path}"))
    }
}
