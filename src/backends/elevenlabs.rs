use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::backends::parse_base_url;
use crate::error::ChatError;
use crate::tts::{create_audio_stream, AudioStream, TextToSpeechProvider};

/// ElevenLabs text to speech backend implementation
///
/// Alternative voice provider for personas that live on ElevenLabs rather
/// than Fish Audio.
pub struct ElevenLabs {
    /// API key for ElevenLabs authentication
    api_key: String,
    /// Synthesis model identifier
    model_id: String,
    /// Base URL for API requests
    base_url: Url,
    /// Optional timeout duration in seconds
    timeout_seconds: Option<u64>,
    /// HTTP client for making requests
    client: Client,
    /// Voice ID to use for speech synthesis
    voice: String,
}

#[derive(Serialize, Debug)]
struct ElevenLabsSpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabs {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.elevenlabs.io/v1/";
    pub const DEFAULT_MODEL: &'static str = "eleven_multilingual_v2";

    /// Creates a new ElevenLabs instance
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for ElevenLabs authentication
    /// * `voice` - Voice ID to speak with
    /// * `model_id` - Synthesis model, defaults to `eleven_multilingual_v2`
    /// * `base_url` - Optional override of the API root
    /// * `timeout_seconds` - Optional timeout duration in seconds
    pub fn new(
        api_key: impl Into<String>,
        voice: impl Into<String>,
        model_id: Option<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            api_key: api_key.into(),
            model_id: model_id.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            base_url: parse_base_url(base_url.as_deref().unwrap_or(Self::DEFAULT_BASE_URL))?,
            timeout_seconds,
            client: Client::new(),
            voice: voice.into(),
        })
    }
}

#[async_trait]
impl TextToSpeechProvider for ElevenLabs {
    /// Converts text to speech using the ElevenLabs API
    ///
    /// # Arguments
    ///
    /// * `text` - Text to convert to speech
    ///
    /// # Returns
    ///
    /// * `Ok(AudioStream)` - MP3 audio, 44.1kHz at 128kbps
    /// * `Err(ChatError)` - Error if the request was rejected
    async fn speech_stream(&self, text: &str) -> Result<AudioStream, ChatError> {
        if self.api_key.is_empty() {
            return Err(ChatError::AuthError("Missing ElevenLabs API key".into()));
        }

        let mut url = self
            .base_url
            .join(&format!("text-to-speech/{}", self.voice))
            .map_err(|e| ChatError::HttpError(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("output_format", "mp3_44100_128");

        let body = ElevenLabsSpeechRequest {
            text,
            model_id: &self.model_id,
        };

        let mut req = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&body);

        if let Some(t) = self.timeout_seconds {
            req = req.timeout(Duration::from_secs(t));
        }

        let resp = req.send().await?;
        log::debug!("ElevenLabs HTTP status: {}", resp.status());

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(ChatError::ResponseFormatError {
                message: format!("ElevenLabs API returned error status: {status}"),
                raw_response: error_text,
            });
        }

        Ok(create_audio_stream(resp))
    }

    fn voice(&self) -> &str {
        &self.voice
    }
}
