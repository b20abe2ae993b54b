//! Fish Audio text-to-speech client
//!
//! Synthesizes speech with a cloned voice identified by its reference id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::backends::parse_base_url;
use crate::error::ChatError;
use crate::tts::{create_audio_stream, AudioStream, TextToSpeechProvider};

/// Fish Audio speech synthesis backend
pub struct FishAudio {
    /// API key for Fish Audio authentication
    api_key: String,
    /// Voice model reference id
    reference_id: String,
    /// Base URL for API requests
    base_url: Url,
    /// Optional timeout duration in seconds
    timeout_seconds: Option<u64>,
    /// HTTP client for making requests
    client: Client,
}

#[derive(Serialize, Debug)]
struct FishTtsRequest<'a> {
    text: &'a str,
    reference_id: &'a str,
    format: &'a str,
    latency: &'a str,
}

impl FishAudio {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.fish.audio/";

    /// Creates a new Fish Audio instance
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for Fish Audio authentication
    /// * `reference_id` - Identifier of the voice model to speak with
    /// * `base_url` - Optional override of the API root
    /// * `timeout_seconds` - Optional timeout duration in seconds
    pub fn new(
        api_key: impl Into<String>,
        reference_id: impl Into<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            api_key: api_key.into(),
            reference_id: reference_id.into(),
            base_url: parse_base_url(base_url.as_deref().unwrap_or(Self::DEFAULT_BASE_URL))?,
            timeout_seconds,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl TextToSpeechProvider for FishAudio {
    async fn speech_stream(&self, text: &str) -> Result<AudioStream, ChatError> {
        if self.api_key.is_empty() {
            return Err(ChatError::AuthError("Missing Fish Audio API key".into()));
        }

        let url = self
            .base_url
            .join("v1/tts")
            .map_err(|e| ChatError::HttpError(e.to_string()))?;

        let body = FishTtsRequest {
            text,
            reference_id: &self.reference_id,
            format: "mp3",
            latency: "balanced",
        };

        let mut req = self.client.post(url).bearer_auth(&self.api_key).json(&body);

        if let Some(t) = self.timeout_seconds {
            req = req.timeout(Duration::from_secs(t));
        }

        let resp = req.send().await?;
        log::debug!("Fish Audio HTTP status: {}", resp.status());

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(ChatError::ResponseFormatError {
                message: format!("Fish Audio API returned error status: {status}"),
                raw_response: error_text,
            });
        }

        Ok(create_audio_stream(resp))
    }

    fn voice(&self) -> &str {
        &self.reference_id
    }
}
