//! Flora Storage - AI result cache, record store and image upload
//!
//! The remote record store and blob storage are abstracted behind
//! [`RecordStore`] and [`BlobStore`]; the in-memory implementations here back
//! the tests and offline runs. The local AI cache lives in [`cache`].

pub mod blobs;
pub mod cache;
pub mod images;
pub mod records;

pub use blobs::{image_upload_path, upload_images, BlobStore, MemoryBlobStore};
pub use cache::{
    CacheConfig, CacheKey, CacheStats, Clock, ExpiringCache, KeyValueStore, LmdbStore,
    LmdbStoreError, ManualClock, MemoryStore, SystemClock,
};
pub use images::{compress_jpeg, decode_data_url, encode_jpeg_data_url, DecodedImage, ImageError};
pub use records::{MemoryRecordStore, RecordStore, StoreStatistics};
