//! Error types for Flora operations

use thiserror::Error;

/// Remote record store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Record store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Image upload failed for {path}: {reason}")]
    UploadFailed { path: String, reason: String },

    #[error("Stored record {id} could not be decoded: {reason}")]
    Serialization { id: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// AI content provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("No AI content provider configured")]
    NotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Transport error talking to {provider}: {reason}")]
    Transport { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ProviderError {
    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::NotConfigured => false,
            ProviderError::RequestFailed { status, .. } => *status >= 500,
            ProviderError::RateLimited { .. } | ProviderError::Transport { .. } => true,
            ProviderError::InvalidResponse { .. } => true,
        }
    }
}

/// Local key/value cache backend errors.
///
/// These never escape the expiring cache in `flora-storage`; they travel only
/// between a backend and the cache wrapper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache storage quota exceeded")]
    QuotaExceeded,

    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Corrupt cache entry at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {reason}")]
    Parse { reason: String },
}

/// Master error type for all Flora errors.
#[derive(Debug, Clone, Error)]
pub enum FloraError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Flora operations.
pub type FloraResult<T> = Result<T, FloraError>;

// =============================================================================
// TESTS
// =============================================================================
