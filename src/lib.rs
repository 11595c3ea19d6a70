//! Workspace umbrella crate for querygate.
//!
//! [`Gateway`] ties the translation layer to a document store and an
//! inference client: every search request is translated into a [`Filter`]
//! first, and only a successfully translated filter reaches the store.

pub use inference::{
    DisabledInference, InferenceConfig, InferenceError, InferenceMode, LiteralInference,
    ResponsesClient, TextInference, WithTimeout, build_inference,
};
pub use store::{DocumentStore, InMemoryStore, StoreBackend, StoreConfig, StoreError, build_store};
pub use translate::{
    AI_SEARCH_FIELDS, Filter, RegexMatch, TranslateConfig, TranslateError,
    build_ai_assisted_regex_filter, build_exact_filter, build_regex_filter, match_all,
    passthrough_filter,
};

use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Errors returned by [`Gateway`] operations, flattened to what an HTTP
/// surface needs to decide between a 400 and a 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Missing parameter or unusable field name.
    InvalidRequest(String),
    /// Exact-match value is not a number.
    InvalidValueFormat(String),
    /// Caller pattern failed validation or was refused by the store.
    InvalidPattern(String),
    /// Passthrough body is not a filter the store accepts.
    MalformedFilter(String),
    /// The inference call failed, timed out or returned an unusable pattern.
    InferenceUnavailable(String),
    /// The store could not be reached or failed while executing the query.
    StoreUnavailable(String),
}

impl GatewayError {
    /// `true` when the request itself is at fault.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            GatewayError::InferenceUnavailable(_) | GatewayError::StoreUnavailable(_)
        )
    }

    /// Message safe to show to the caller. Upstream detail stays in the logs
    /// for server-side failures.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::InferenceUnavailable(_) => "AI processing failed".to_string(),
            GatewayError::StoreUnavailable(_) => "Failed to retrieve documents".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            GatewayError::InvalidValueFormat(msg) => write!(f, "Invalid value format: {msg}"),
            GatewayError::InvalidPattern(msg) => write!(f, "Invalid pattern: {msg}"),
            GatewayError::MalformedFilter(msg) => write!(f, "Invalid query format: {msg}"),
            GatewayError::InferenceUnavailable(msg) => write!(f, "inference unavailable: {msg}"),
            GatewayError::StoreUnavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl Error for GatewayError {}

impl From<TranslateError> for GatewayError {
    fn from(value: TranslateError) -> Self {
        match value {
            TranslateError::MissingParameter(name) => {
                GatewayError::InvalidRequest(format!("missing query parameter `{name}`"))
            }
            TranslateError::InvalidField(field) => {
                GatewayError::InvalidRequest(format!("invalid field name `{field}`"))
            }
            TranslateError::InvalidValueFormat(raw) => {
                GatewayError::InvalidValueFormat(format!("`{raw}` is not a number"))
            }
            TranslateError::InvalidPattern(msg) => GatewayError::InvalidPattern(msg),
            TranslateError::MalformedFilter(msg) => GatewayError::MalformedFilter(msg),
            TranslateError::InferenceUnavailable(msg) => GatewayError::InferenceUnavailable(msg),
        }
    }
}

/// Who authored the filter being executed; decides how a store refusal is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Generated,
    Inferred,
    CallerPattern,
    CallerFilter,
}

fn store_failure(err: StoreError, origin: Origin) -> GatewayError {
    let refused = matches!(err, StoreError::Rejected(_) | StoreError::InvalidDocument(_));
    match origin {
        Origin::CallerFilter if refused => GatewayError::MalformedFilter(err.to_string()),
        Origin::CallerPattern if refused => GatewayError::InvalidPattern(err.to_string()),
        Origin::Inferred if refused => GatewayError::InferenceUnavailable(err.to_string()),
        _ => GatewayError::StoreUnavailable(err.to_string()),
    }
}

/// Deadlines and translation policy for a [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub translate: TranslateConfig,
    pub store_timeout: Duration,
    pub inference_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            translate: TranslateConfig::default(),
            store_timeout: Duration::from_secs(10),
            inference_timeout: Duration::from_secs(15),
        }
    }
}

/// Search operations over one collection.
///
/// Cheap to share behind an `Arc`; holds no per-request state. Dropping a
/// pending operation future cancels the in-flight store or inference call.
pub struct Gateway {
    store: Arc<dyn DocumentStore>,
    inference: WithTimeout,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        inference: Arc<dyn TextInference>,
        config: GatewayConfig,
    ) -> Self {
        let inference = WithTimeout::new(inference, config.inference_timeout);
        Self {
            store,
            inference,
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The store handle, for lifecycle management (shutdown).
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Documents whose `field` equals the number parsed from `raw`.
    pub async fn exact(&self, field: &str, raw: &str) -> Result<Vec<Value>, GatewayError> {
        tracing::info!(field, value = raw, "exact search");
        let filter = build_exact_filter(field, raw)?;
        self.execute(&filter, Origin::Generated).await
    }

    /// Documents whose `field` matches `pattern`, case-insensitively.
    pub async fn regex(&self, field: &str, pattern: &str) -> Result<Vec<Value>, GatewayError> {
        tracing::info!(field, pattern, "regex search");
        let filter = build_regex_filter(field, pattern, &self.config.translate)?;
        self.execute(&filter, Origin::CallerPattern).await
    }

    /// Derive a pattern from `query` via inference and search `field`, or
    /// both [`AI_SEARCH_FIELDS`] when `field` is `None`.
    pub async fn ai_assisted(
        &self,
        field: Option<&str>,
        query: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        tracing::info!(field = field.unwrap_or("title|description"), query, "ai-assisted search");
        let filter =
            build_ai_assisted_regex_filter(&self.inference, field, query, &self.config.translate)
                .await?;
        self.execute(&filter, Origin::Inferred).await
    }

    /// Run a caller-authored filter document.
    pub async fn passthrough(&self, body: Value) -> Result<Vec<Value>, GatewayError> {
        tracing::info!(filter = %body, "passthrough search");
        let filter = passthrough_filter(body, &self.config.translate)?;
        self.execute(&filter, Origin::CallerFilter).await
    }

    /// Every document in the collection.
    pub async fn all(&self) -> Result<Vec<Value>, GatewayError> {
        self.execute(&match_all(), Origin::Generated).await
    }

    async fn execute(&self, filter: &Filter, origin: Origin) -> Result<Vec<Value>, GatewayError> {
        let query = filter.to_query();
        let limit = self.config.store_timeout;
        let outcome = match tokio::time::timeout(limit, self.store.find(&query)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(limit)),
        };
        match outcome {
            Ok(documents) => {
                tracing::debug!(store = self.store.name(), count = documents.len(), "query done");
                Ok(documents)
            }
            Err(err) => {
                tracing::warn!(store = self.store.name(), error = %err, "query failed");
                Err(store_failure(err, origin))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_classified() {
        assert!(GatewayError::InvalidRequest("x".into()).is_caller_error());
        assert!(GatewayError::MalformedFilter("x".into()).is_caller_error());
        assert!(!GatewayError::InferenceUnavailable("x".into()).is_caller_error());
        assert!(!GatewayError::StoreUnavailable("x".into()).is_caller_error());
    }

    #[test]
    fn public_message_hides_upstream_detail() {
        let err = GatewayError::StoreUnavailable("connection refused 10.0.0.3:27017".into());
        assert_eq!(err.public_message(), "Failed to retrieve documents");
        let err = GatewayError::InferenceUnavailable("401 invalid api key".into());
        assert_eq!(err.public_message(), "AI processing failed");
        let err: GatewayError = TranslateError::InvalidValueFormat("abc".into()).into();
        assert_eq!(err.public_message(), "Invalid value format: `abc` is not a number");
    }

    #[test]
    fn store_refusal_depends_on_origin() {
        let rejected = || StoreError::Rejected("unknown operator: $foo".into());
        assert!(matches!(
            store_failure(rejected(), Origin::CallerFilter),
            GatewayError::MalformedFilter(_)
        ));
        assert!(matches!(
            store_failure(rejected(), Origin::CallerPattern),
            GatewayError::InvalidPattern(_)
        ));
        assert!(matches!(
            store_failure(rejected(), Origin::Generated),
            GatewayError::StoreUnavailable(_)
        ));
        assert!(matches!(
            store_failure(rejected(), Origin::Inferred),
            GatewayError::InferenceUnavailable(_)
        ));
        assert!(matches!(
            store_failure(StoreError::Timeout(Duration::from_secs(1)), Origin::Inferred),
            GatewayError::StoreUnavailable(_)
        ));
        assert!(matches!(
            store_failure(StoreError::Connection("down".into()), Origin::CallerFilter),
            GatewayError::StoreUnavailable(_)
        ));
    }
}
