use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which inference backend answers pattern requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Remote OpenAI Responses API.
    #[default]
    Api,
    /// No remote call: the query is regex-escaped and used verbatim.
    Literal,
}

/// Runtime configuration for the text-inference client.
///
/// # Example
/// ```
/// use inference::{InferenceConfig, InferenceMode};
///
/// let cfg = InferenceConfig {
///     api_key: Some("sk-test".into()),
///     prompt_id: Some("pmpt_123".into()),
///     prompt_version: Some("3".into()),
///     ..Default::default()
/// };
/// assert_eq!(cfg.mode, InferenceMode::Api);
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Backend selector: `"api"` (default) or `"literal"`.
    pub mode: InferenceMode,
    /// Full URL of the Responses endpoint.
    pub api_url: String,
    /// Bearer credential. Required in `api` mode.
    pub api_key: Option<String>,
    /// Stored prompt id. When set, the request references the stored prompt
    /// instead of sending `model` and `instructions`.
    pub prompt_id: Option<String>,
    /// Version of the stored prompt.
    pub prompt_version: Option<String>,
    /// Model used when no stored prompt is configured.
    pub model: String,
    /// System instructions used when no stored prompt is configured.
    pub instructions: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            mode: InferenceMode::Api,
            api_url: "https://api.openai.com/v1/responses".into(),
            api_key: None,
            prompt_id: None,
            prompt_version: None,
            model: "gpt-4o-mini".into(),
            instructions: DEFAULT_INSTRUCTIONS.into(),
            timeout_secs: 15,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("mode", &self.mode)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("prompt_id", &self.prompt_id)
            .field("prompt_version", &self.prompt_version)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

const DEFAULT_INSTRUCTIONS: &str = "Turn the user's search request into a single regular \
expression that matches the text they are looking for. Reply with the regular expression \
only: no delimiters, no flags, no explanation.";
