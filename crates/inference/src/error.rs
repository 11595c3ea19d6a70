use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`TextInference`](crate::TextInference) implementations.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Configuration is incomplete (e.g., `api` mode without an API key).
    #[error("inference not configured: {0}")]
    NotConfigured(String),
    /// Transport-level failure talking to the inference service.
    #[error("http request failed: {0}")]
    Http(String),
    /// The service answered with a non-success status.
    #[error("inference service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("invalid inference response: {0}")]
    InvalidResponse(String),
    /// The service answered but produced no text.
    #[error("inference returned no usable text")]
    EmptyOutput,
    /// The call did not complete within the configured bound.
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
}
