//! Error types for the Gemini API client.

use thiserror::Error;

/// Errors that can occur when calling the Gemini generateContent endpoint.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The server returned HTTP 429. `retry_after_ms` is how long the
    /// server asked us to wait before trying again.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other HTTP error from the API (invalid key, quota, 5xx).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Underlying network failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The call succeeded but the response carried no usable text.
    #[error("response contained no candidate text")]
    EmptyResponse,
}
