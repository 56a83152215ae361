//! Remote record store interface and an in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use flora_core::{Flower, FlowerDraft, RecordId, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::blobs::{upload_images, BlobStore, MemoryBlobStore};
use crate::cache::{Clock, SystemClock};

/// Async store for flower records.
///
/// Records leave the store in canonical form: legacy documents are migrated
/// (see [`flora_core::migrate_legacy_record`]) before they are returned.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record, newest-created first. Documents that cannot be decoded
    /// are skipped.
    async fn list(&self) -> Result<Vec<Flower>, StoreError>;

    /// A single record, or `None` if no record has this id.
    async fn get(&self, id: &RecordId) -> Result<Option<Flower>, StoreError>;

    /// Persist a new record. Inline images are uploaded and replaced by URLs.
    async fn create(&self, draft: FlowerDraft) -> Result<Flower, StoreError>;

    /// Replace a record's fields. Inline images are uploaded; existing URLs
    /// pass through unchanged.
    async fn update(&self, id: &RecordId, draft: FlowerDraft) -> Result<Flower, StoreError>;

    /// Delete a record. Uploaded images are left in blob storage.
    async fn delete(&self, id: &RecordId) -> Result<(), StoreError>;

    /// Counts for the settings screen.
    async fn statistics(&self) -> Result<StoreStatistics, StoreError>;
}

/// Store statistics for the settings screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub record_count: usize,
    pub image_count: usize,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    /// Insertion order, newest-first tie-break for equal timestamps.
    seq: u64,
    body: Value,
}

/// In-memory [`RecordStore`] with image upload through a [`BlobStore`].
///
/// Documents are kept as raw JSON so legacy shapes can be seeded with
/// [`insert_raw`](Self::insert_raw) and exercise the load-time migration.
pub struct MemoryRecordStore {
    documents: RwLock<HashMap<RecordId, StoredDocument>>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    next_seq: AtomicU64,
    available: AtomicBool,
    mutations: AtomicUsize,
}

impl MemoryRecordStore {
    /// Create an empty store with in-memory blob storage.
    pub fn new() -> Self {
        Self::with_blobs(Arc::new(MemoryBlobStore::new()))
    }

    pub fn with_blobs(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            blobs,
            clock: Arc::new(SystemClock),
            next_seq: AtomicU64::new(0),
            available: AtomicBool::new(true),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Replace the clock used for `createdAt`/`updatedAt` and upload paths.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed a raw document, bypassing validation and migration.
    pub async fn insert_raw(&self, id: RecordId, body: Value) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.documents
            .write()
            .await
            .insert(id, StoredDocument { seq, body });
    }

    /// Raw stored document, as persisted.
    pub async fn raw(&self, id: &RecordId) -> Option<Value> {
        self.documents.read().await.get(id).map(|doc| doc.body.clone())
    }

    /// Simulate a network outage (or recovery).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of create/update/delete calls that reached the store.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                reason: "record store unreachable".to_string(),
            })
        }
    }

    fn decode(id: &RecordId, doc: &StoredDocument) -> Result<Flower, StoreError> {
        Self::reload(id, &doc.body)
    }

    /// Decode a freshly encoded body so callers see exactly what was stored
    /// (timestamps at millisecond precision).
    fn reload(id: &RecordId, body: &Value) -> Result<Flower, StoreError> {
        Flower::from_stored(id, body.clone()).map_err(|e| StoreError::Serialization {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }

    fn encode(flower: &Flower) -> Result<Value, StoreError> {
        let mut body = serde_json::to_value(flower).map_err(|e| StoreError::Serialization {
            id: flower.id.to_string(),
            reason: e.to_string(),
        })?;
        if let Value::Object(map) = &mut body {
            map.remove("id");
        }
        Ok(body)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self) -> Result<Vec<Flower>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;

        let mut decoded = Vec::with_capacity(documents.len());
        for (id, doc) in documents.iter() {
            match Self::decode(id, doc) {
                Ok(flower) => decoded.push((doc.seq, flower)),
                Err(e) => tracing::warn!(record_id = %id, error = %e, "skipping undecodable record"),
            }
        }
        decoded.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        Ok(decoded.into_iter().map(|(_, flower)| flower).collect())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Flower>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;
        documents
            .get(id)
            .map(|doc| Self::decode(id, doc))
            .transpose()
    }

    async fn create(&self, draft: FlowerDraft) -> Result<Flower, StoreError> {
        self.check_available()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);

        let id = RecordId::generate();
        let now = self.clock.now();
        let mut draft = draft;
        let images = std::mem::take(&mut draft.images);
        let images = upload_images(self.blobs.as_ref(), &id, images, now).await?;

        let mut flower = draft.into_flower(id.clone(), Some(now), Some(now));
        flower.images = images;

        let body = Self::encode(&flower)?;
        let flower = Self::reload(&id, &body)?;
        self.insert_raw(id.clone(), body).await;
        tracing::info!(record_id = %id, name = %flower.name, images = flower.images.len(), "record created");
        Ok(flower)
    }

    async fn update(&self, id: &RecordId, draft: FlowerDraft) -> Result<Flower, StoreError> {
        self.check_available()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);

        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let now = self.clock.now();
        let mut draft = draft;
        let images = std::mem::take(&mut draft.images);
        let images = upload_images(self.blobs.as_ref(), id, images, now).await?;

        let mut flower = draft.into_flower(id.clone(), existing.created_at, Some(now));
        flower.images = images;

        let body = Self::encode(&flower)?;
        let flower = Self::reload(id, &body)?;
        let mut documents = self.documents.write().await;
        match documents.get_mut(id) {
            Some(doc) => doc.body = body,
            None => return Err(StoreError::NotFound { id: id.to_string() }),
        }
        tracing::info!(record_id = %id, images = flower.images.len(), "record updated");
        Ok(flower)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.check_available()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);

        let removed = self.documents.write().await.remove(id).is_some();
        tracing::info!(record_id = %id, removed, "record deleted");
        Ok(())
    }

    async fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        let records = self.list().await?;
        Ok(StoreStatistics {
            record_count: records.len(),
            image_count: records.iter().map(|f| f.images.len()).sum(),
        })
    }
}
