use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::{InferenceConfig, InferenceError, TextInference};

/// Longest slice of an error body carried into [`InferenceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Client for the OpenAI Responses API.
///
/// The underlying `reqwest::Client` pools connections, so one instance is
/// built at startup and shared by every request.
pub struct ResponsesClient {
    http: reqwest::Client,
    cfg: InferenceConfig,
    api_key: String,
}

impl ResponsesClient {
    pub fn new(cfg: InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                InferenceError::NotConfigured("api_key is required for api mode".into())
            })?;

        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| InferenceError::NotConfigured(format!("http client: {e}")))?;

        Ok(Self { http, cfg, api_key })
    }

    async fn send(&self, payload: Value) -> Result<Value, InferenceError> {
        let response = self
            .http
            .post(&self.cfg.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.cfg.timeout())
                } else {
                    InferenceError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let mut body = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(InferenceError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| InferenceError::InvalidResponse(format!("invalid JSON: {e}")))
    }
}

#[async_trait]
impl TextInference for ResponsesClient {
    async fn infer(&self, input: &str) -> Result<String, InferenceError> {
        let payload = build_payload(&self.cfg, input);
        tracing::debug!(url = %self.cfg.api_url, "sending inference request");
        let response = self.send(payload).await?;
        extract_output_text(&response)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Stored prompts take precedence over inline `model`/`instructions`.
fn build_payload(cfg: &InferenceConfig, input: &str) -> Value {
    match cfg.prompt_id.as_deref() {
        Some(id) => {
            let mut prompt = json!({ "id": id });
            if let Some(version) = cfg.prompt_version.as_deref() {
                prompt["version"] = json!(version);
            }
            json!({ "prompt": prompt, "input": input })
        }
        None => json!({
            "model": cfg.model,
            "instructions": cfg.instructions,
            "input": input,
        }),
    }
}

/// Pull the generated text out of a Responses API body.
///
/// SDK-style bodies carry a flattened `output_text`; raw bodies nest text
/// parts under `output[].content[]` with `type == "output_text"`.
fn extract_output_text(value: &Value) -> Result<String, InferenceError> {
    if let Some(text) = value.get("output_text").and_then(Value::as_str) {
        return non_empty(text);
    }

    let output = value
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| InferenceError::InvalidResponse("missing `output` array".into()))?;

    let mut text = String::new();
    for item in output {
        let Some(content) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for part in content {
            if part.get("type").and_then(Value::as_str) != Some("output_text") {
                continue;
            }
            if let Some(fragment) = part.get("text").and_then(Value::as_str) {
                text.push_str(fragment);
            }
        }
    }

    non_empty(&text)
}

fn non_empty(text: &str) -> Result<String, InferenceError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(InferenceError::EmptyOutput)
    } else {
        Ok(trimmed.to_string())
    }
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
