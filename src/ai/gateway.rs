//! Core `AiGateway` trait and `ApiGateway` implementation.
//!
//! `ApiGateway` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! — Ollama (OpenAI mode), OpenAI, Groq, LM Studio, vLLM, etc.
//! All connection details come from [`AiConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::ai::prompt::{contains_affirmative, PromptBuilder};
use crate::config::AiConfig;

// ---------------------------------------------------------------------------
// AiError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the remote model.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("model request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// The model returned a response with no usable text content.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else {
            AiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AiGateway trait
// ---------------------------------------------------------------------------

/// Async trait for the two remote model operations.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn AiGateway>`).  Both calls are stateless and
/// single-attempt; callers decide what a failure means.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Ask the model whether `source` contains errors.
    async fn classify(&self, source: &str) -> Result<bool, AiError>;

    /// Ask the model for a corrected version of `source`.
    async fn correct(&self, source: &str) -> Result<String, AiError>;
}

// ---------------------------------------------------------------------------
// ApiGateway
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with: Ollama (OpenAI mode), OpenAI, Groq, Together.ai, LM Studio,
/// vLLM — any provider that speaks the OpenAI chat-completions wire format.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `model`) come exclusively
/// from the [`AiConfig`] passed to [`ApiGateway::from_config`].
pub struct ApiGateway {
    client: reqwest::Client,
    config: AiConfig,
    prompts: PromptBuilder,
}

impl ApiGateway {
    /// Build an `ApiGateway` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let prompts = PromptBuilder::new(&config.dialect);

        Self {
            client,
            config: config.clone(),
            prompts,
        }
    }

    /// Send one chat-completions request and return the reply text.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// Ollama and other local providers that require no authentication.
    async fn chat(&self, system_msg: &str, user_msg: &str) -> Result<String, AiError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream":      false,
            "temperature": self.config.temperature
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(AiError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl AiGateway for ApiGateway {
    async fn classify(&self, source: &str) -> Result<bool, AiError> {
        let (system_msg, user_msg) = self.prompts.detection_chat(source);
        let answer = self.chat(&system_msg, &user_msg).await?;
        log::debug!("gateway: detection reply = {answer:?}");
        Ok(contains_affirmative(&answer))
    }

    async fn correct(&self, source: &str) -> Result<String, AiError> {
        let (system_msg, user_msg) = self.prompts.fix_chat(source);
        self.chat(&system_msg, &user_msg).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> AiConfig {
        AiConfig {
            enabled: true,
            base_url: "http://localhost:11434".into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "qwen2.5:3b".into(),
            dialect: "Arduino".into(),
            temperature: 0.2,
            timeout_secs: 15,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let config = make_config(None);
        let _gateway = ApiGateway::from_config(&config);
    }

    #[test]
    fn from_config_accepts_empty_api_key() {
        let config = make_config(Some(""));
        let _gateway = ApiGateway::from_config(&config);
    }

    #[test]
    fn from_config_accepts_real_api_key() {
        let config = make_config(Some("sk-test-1234"));
        let _gateway = ApiGateway::from_config(&config);
    }

    /// Verify that `ApiGateway` is object-safe (usable as `dyn AiGateway`).
    #[test]
    fn gateway_is_object_safe() {
        let config = make_config(None);
        let gateway: Box<dyn AiGateway> = Box::new(ApiGateway::from_config(&config));
        drop(gateway);
    }
}
