//! # Querygate Inference
//!
//! Text-in/text-out clients used to turn a free-form search request into a
//! regular-expression fragment. The service itself is opaque: callers only see
//! the [`TextInference`] trait.
//!
//! Two implementations ship with the crate:
//!
//! - [`ResponsesClient`]: calls the OpenAI Responses API, either with a stored
//!   prompt (`prompt_id` / `prompt_version`) or with inline instructions.
//! - [`LiteralInference`]: no network; escapes the query so it matches itself.
//!
//! [`WithTimeout`] bounds any client with a deadline, and [`DisabledInference`]
//! fills in when no client could be built.
//!
//! ```no_run
//! use inference::{build_inference, InferenceConfig};
//!
//! # async fn run() -> Result<(), inference::InferenceError> {
//! let cfg = InferenceConfig {
//!     api_key: Some("sk-...".into()),
//!     ..Default::default()
//! };
//! let client = build_inference(&cfg)?;
//! let pattern = client.infer("red or crimson shoes").await?;
//! println!("{pattern}");
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod error;
mod stub;
mod timeout;

use async_trait::async_trait;
use std::sync::Arc;

pub use api::ResponsesClient;
pub use config::{InferenceConfig, InferenceMode};
pub use error::InferenceError;
pub use stub::{DisabledInference, LiteralInference};
pub use timeout::WithTimeout;

/// An external text-to-text service.
#[async_trait]
pub trait TextInference: Send + Sync {
    /// Derive text from `input`. One call per invocation; nothing is cached.
    async fn infer(&self, input: &str) -> Result<String, InferenceError>;

    /// Short provider label used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Build the client selected by `cfg.mode`.
pub fn build_inference(cfg: &InferenceConfig) -> Result<Arc<dyn TextInference>, InferenceError> {
    match cfg.mode {
        InferenceMode::Api => Ok(Arc::new(ResponsesClient::new(cfg.clone())?)),
        InferenceMode::Literal => Ok(Arc::new(LiteralInference)),
    }
}
