//! Configuration types

use crate::{ConfigError, FloraError, FloraResult, Language};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Namespace prefix of AI cache keys.
pub const DEFAULT_CACHE_NAMESPACE: &str = "flora_ai";

/// Days an AI cache entry stays fresh.
pub const DEFAULT_CACHE_TTL_DAYS: u32 = 7;

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Local AI cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// LMDB directory. `None` keeps the cache in memory.
    pub path: Option<PathBuf>,
    /// Key namespace; only keys under it are read, swept or counted.
    pub namespace: String,
    pub ttl_days: u32,
    /// LMDB map size; writes beyond it fail with quota exhaustion.
    pub map_size_mb: usize,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_days) * 24 * 60 * 60)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: None,
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            ttl_days: DEFAULT_CACHE_TTL_DAYS,
            map_size_mb: 16,
        }
    }
}

/// AI content provider settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Gemini API key. AI features are hidden when absent.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_concurrent: usize,
    pub min_interval_ms: u64,
}

impl ProviderSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_ms: 30_000,
            max_concurrent: 2,
            min_interval_ms: 250,
        }
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_concurrent", &self.max_concurrent)
            .field("min_interval_ms", &self.min_interval_ms)
            .finish()
    }
}

/// Application-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Origin + path that share links and QR codes point at.
    pub share_base_url: String,
    pub base_language: Language,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            share_base_url: "http://localhost:5173/".to_string(),
            base_language: Language::BASE,
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FloraConfig {
    pub cache: CacheSettings,
    pub provider: ProviderSettings,
    pub app: AppSettings,
}

impl FloraConfig {
    /// Validate the configuration.
    ///
    /// Validates:
    /// - cache namespace is non-empty and free of the key delimiter
    /// - cache TTL and map size are positive
    /// - provider model, base URL, timeout and concurrency are usable
    /// - share base URL is absolute http(s)
    pub fn validate(&self) -> FloraResult<()> {
        if self.cache.namespace.trim().is_empty() {
            return Err(invalid("cache.namespace", &self.cache.namespace, "must not be empty"));
        }
        if self.cache.namespace.contains(':') {
            return Err(invalid(
                "cache.namespace",
                &self.cache.namespace,
                "must not contain ':'",
            ));
        }
        if self.cache.ttl_days == 0 {
            return Err(invalid("cache.ttl_days", "0", "must be positive"));
        }
        if self.cache.map_size_mb == 0 {
            return Err(invalid("cache.map_size_mb", "0", "must be positive"));
        }

        if self.provider.model.trim().is_empty() {
            return Err(invalid("provider.model", &self.provider.model, "must not be empty"));
        }
        if !is_http_url(&self.provider.base_url) {
            return Err(invalid(
                "provider.base_url",
                &self.provider.base_url,
                "must start with http:// or https://",
            ));
        }
        if self.provider.timeout_ms == 0 {
            return Err(invalid("provider.timeout_ms", "0", "must be positive"));
        }
        if self.provider.max_concurrent == 0 {
            return Err(invalid("provider.max_concurrent", "0", "must be positive"));
        }

        if !is_http_url(&self.app.share_base_url) {
            return Err(invalid(
                "app.share_base_url",
                &self.app.share_base_url,
                "must start with http:// or https://",
            ));
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn invalid(field: &str, value: &str, reason: &str) -> FloraError {
    FloraError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        FloraConfig::default()
            .validate()
            .expect("default config should validate");
    }

    #[test]
    fn test_default_ttl_is_seven_days() {
        assert_eq!(
            CacheSettings::default().ttl(),
            Duration::from_secs(7 * 24 * 60 * 60)
        );
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = FloraConfig::default();
        config.cache.ttl_days = 0;
        let err = config.validate().expect_err("zero ttl must fail");
        assert!(err.to_string().contains("cache.ttl_days"));
    }

    #[test]
    fn test_namespace_with_delimiter_rejected() {
        let mut config = FloraConfig::default();
        config.cache.namespace = "flora:ai".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = FloraConfig::default();
        config.provider.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_share_url_must_be_http() {
        let mut config = FloraConfig::default();
        config.app.share_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_debug_redacts_api_key() {
        let settings = ProviderSettings {
            api_key: Some("secret-key".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("REDACTED"));
        assert!(settings.is_configured());
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let settings = ProviderSettings {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!settings.is_configured());
    }
}
