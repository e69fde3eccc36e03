//! `Synthesizer` trait and the OpenAI-compatible `/v1/audio/speech` backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SpeechConfig;
use crate::speech::voice::Voice;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("synthesis endpoint returned status {0}")]
    Status(u16),

    /// The endpoint returned no audio bytes.
    #[error("synthesis endpoint returned no audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for text-to-speech backends.
///
/// Returns encoded audio (mp3 or wav); decoding is the playback thread's
/// concern.  Implementors must be `Send + Sync` for `Arc<dyn Synthesizer>`.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError>;
}

// ---------------------------------------------------------------------------
// ApiSynthesizer
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/audio/speech` endpoint.
///
/// All connection details (`base_url`, `api_key`, `model`) come from the
/// [`SpeechConfig`] passed to [`ApiSynthesizer::from_config`].
pub struct ApiSynthesizer {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl ApiSynthesizer {
    /// Build an `ApiSynthesizer` from application config.
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Synthesizer for ApiSynthesizer {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError> {
        let url = format!("{}/v1/audio/speech", self.config.base_url);

        let body = serde_json::json!({
            "model": self.config.model,
            "input": text,
            "voice": voice.id()
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Status(status.as_u16()));
        }

        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
