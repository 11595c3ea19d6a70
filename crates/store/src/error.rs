use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`DocumentStore`](crate::DocumentStore) backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configuration is inconsistent (e.g., mongodb backend without a connection string).
    #[error("invalid store config: {0}")]
    InvalidConfig(String),
    /// Unable to reach the store.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The store refused the filter (unknown operator, bad regex, type mismatch).
    #[error("filter rejected: {0}")]
    Rejected(String),
    /// A document or filter could not be converted to the store's format.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// The call did not complete within the configured bound.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }

    pub(crate) fn rejected(msg: impl Into<String>) -> Self {
        StoreError::Rejected(msg.into())
    }
}
