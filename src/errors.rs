/*!
 * Error types for the subsync application.
 *
 * Each layer of the sync pipeline has its own error enum, defined with the
 * thiserror crate. Application plumbing (configuration, database, process
 * spawning) uses anyhow on top of these.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// The backend returned a different number of lines than it was given
    #[error("Backend returned {actual} lines for a batch of {expected}")]
    MisalignedBatch {
        /// Number of lines submitted
        expected: usize,
        /// Number of lines returned
        actual: usize,
    },
}

impl ProviderError {
    /// Whether retrying later (or elsewhere) could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_)
                | ProviderError::ConnectionError(_)
                | ProviderError::RateLimitExceeded(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout(0)
        } else if error.is_connect() {
            ProviderError::ConnectionError(error.to_string())
        } else if error.is_decode() {
            ProviderError::ParseError(error.to_string())
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while querying the catalog service
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The service could not be reached or answered with a server error
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// The API key was rejected
    #[error("Catalog rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    /// The response body did not have the expected shape
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            CatalogError::InvalidResponse(error.to_string())
        } else {
            CatalogError::Unavailable(error.to_string())
        }
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A block's timing line is missing or cannot be parsed
    #[error("Malformed timing in block {block}: {line:?}")]
    MalformedTiming {
        /// 1-based block number in the file
        block: usize,
        /// Offending line
        line: String,
    },

    /// A block does not start with a numeric index
    #[error("Malformed index in block {block}: {line:?}")]
    MalformedIndex {
        /// 1-based block number in the file
        block: usize,
        /// Offending line
        line: String,
    },

    /// The file contained no subtitle entries
    #[error("Subtitle file contains no entries")]
    Empty,

    /// The file format cannot be parsed
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// Reading the file failed
    #[error("Failed to read subtitle file {path:?}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Every backend in the chain failed for one batch
    #[error("All {attempts} backends failed for batch {batch}: {last_error}")]
    AllBackendsFailed {
        /// 1-based batch number
        batch: usize,
        /// Number of backends tried
        attempts: usize,
        /// Error reported by the last backend
        last_error: String,
        /// Every backend failed with a transient error
        transient: bool,
    },

    /// The pipeline was built without any backend
    #[error("No translation backend configured")]
    NoBackends,

    /// Writing the translated file failed
    #[error("Failed to write {path:?}: {message}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Error message
        message: String,
    },
}

impl TranslationError {
    /// True when the chain only hit outages, so a later run may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AllBackendsFailed { transient: true, .. })
    }
}
