use reqwest::Url;

use crate::error::ChatError;

/// Chat completion against OpenAI-compatible endpoints
pub mod openai;

/// Speech synthesis through Fish Audio
pub mod fish_audio;

/// Speech synthesis through ElevenLabs
pub mod elevenlabs;

/// Parses a base URL, making sure relative endpoint joins keep its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ChatError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| ChatError::ConfigError(format!("invalid base URL '{raw}': {e}")))
}
