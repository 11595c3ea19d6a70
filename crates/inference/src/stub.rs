use async_trait::async_trait;

use crate::{InferenceError, TextInference};

/// Deterministic stand-in used when `mode` is `"literal"`. The query is
/// escaped so it matches itself as a substring.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralInference;

#[async_trait]
impl TextInference for LiteralInference {
    async fn infer(&self, input: &str) -> Result<String, InferenceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }
        Ok(regex::escape(trimmed))
    }

    fn name(&self) -> &str {
        "literal"
    }
}

/// Stands in for a client that could not be built. Every call fails with the
/// construction error, so the rest of the service keeps working.
#[derive(Debug, Clone)]
pub struct DisabledInference {
    reason: String,
}

impl DisabledInference {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextInference for DisabledInference {
    async fn infer(&self, _input: &str) -> Result<String, InferenceError> {
        Err(InferenceError::NotConfigured(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
