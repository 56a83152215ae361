//! Gemini HTTP client with rate limiting

use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse};
use flora_core::{ProviderError, ProviderSettings};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

const PROVIDER: &str = "gemini";

/// Gemini API client with rate limiting.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_request_interval: Duration,
}

impl GeminiClient {
    /// Create a client from provider settings.
    ///
    /// Fails with [`ProviderError::NotConfigured`] when no API key is set.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::NotConfigured)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            rate_limiter: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            last_request: Arc::new(Mutex::new(None)),
            min_request_interval: Duration::from_millis(settings.min_interval_ms),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Wait until at least the minimum interval has passed since the last
    /// request started.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                tokio::time::sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Send a prompt (and optionally a base64 JPEG) and return the answer text.
    pub async fn generate(&self, prompt: &str, image_base64: Option<&str>) -> Result<String, ProviderError> {
        let _permit = self.rate_limiter.acquire().await.map_err(|e| ProviderError::Transport {
            provider: PROVIDER.to_string(),
            reason: format!("Rate limiter error: {e}"),
        })?;
        self.pace().await;

        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest::new(prompt, image_base64))
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER.to_string(),
                reason: format!("HTTP request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        tracing::debug!(
            model = %self.model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            with_image = image_base64.is_some(),
            "gemini request completed"
        );

        if status.is_success() {
            let body: GenerateContentResponse = response.json().await.map_err(|e| ProviderError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to parse response: {}", e.without_url()),
            })?;
            return Ok(body.text().to_string());
        }

        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000)
            .unwrap_or(0);

        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&error_text)
            .ok()
            .map(|api_error| api_error.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Gemini API error".to_string());

        tracing::warn!(status = status.as_u16(), message = %message, "gemini request failed");

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                provider: PROVIDER.to_string(),
                retry_after_ms,
            },
            _ => ProviderError::RequestFailed {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            },
        })
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
