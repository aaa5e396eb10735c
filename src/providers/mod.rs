/*!
 * Translation backends.
 *
 * Every backend turns a batch of subtitle lines into the same number of
 * translated lines, in order:
 * - `libre`: LibreTranslate server
 * - `mymemory`: MyMemory public API
 * - `google`: Google Cloud Translation v2
 * - `ollama`: local LLM through Ollama
 * - `mock`: scripted backend for tests and benchmarks
 */

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use crate::app_config::{BackendConfig, BackendKind, TranslationConfig};
use crate::errors::ProviderError;

pub mod google;
pub mod libre;
pub mod mock;
pub mod mymemory;
pub mod ollama;

pub use google::GoogleTranslate;
pub use libre::LibreTranslate;
pub use mock::{MockBackend, MockBehavior};
pub use mymemory::MyMemory;
pub use ollama::Ollama;

/// Size limits of a single backend request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_chars: usize,
    pub max_entries: usize,
}

impl BatchLimits {
    pub fn new(max_chars: usize, max_entries: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.max_chars_per_request, config.max_entries_per_request)
    }
}

/// Common trait for all translation backends
///
/// Implementations must return exactly one line per input line, in input
/// order. The pipeline checks this and treats a mismatch as a failure.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short name used in logs and sync records
    fn name(&self) -> &str;

    /// Request size limits
    fn limits(&self) -> BatchLimits;

    /// Translate a batch of lines
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Map a non-success HTTP status to a provider error
pub fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("no response body").to_string()
    } else {
        body.chars().take(300).collect()
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}

/// Pass successful responses through, turn the rest into errors
pub(crate) async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// HTTP client shared by the backends of one chain
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))
}

/// Trim a trailing slash so paths can be appended with `format!`
pub(crate) fn base_url(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Create one backend from its configuration entry
pub fn build_backend(config: &BackendConfig, client: Client) -> Arc<dyn TranslationBackend> {
    match config.kind {
        BackendKind::LibreTranslate => Arc::new(LibreTranslate::new(config, client)),
        BackendKind::MyMemory => Arc::new(MyMemory::new(config, client)),
        BackendKind::Google => Arc::new(GoogleTranslate::new(config, client)),
        BackendKind::Ollama => Arc::new(Ollama::new(config, client)),
    }
}

/// Create the enabled backends in fallback order
pub fn build_backends(config: &TranslationConfig) -> Result<Vec<Arc<dyn TranslationBackend>>, ProviderError> {
    let client = http_client(config.request_timeout())?;
    Ok(config
        .enabled_backends()
        .map(|backend| build_backend(backend, client.clone()))
        .collect())
}
