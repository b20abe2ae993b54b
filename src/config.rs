//! Startup configuration read from the process environment.
//!
//! Everything is read once, before the first turn. A missing credential is a
//! [`ChatError::ConfigError`] and the caller is expected to stop there.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::backends::elevenlabs::ElevenLabs;
use crate::backends::fish_audio::FishAudio;
use crate::backends::openai::OpenAI;
use crate::chat::ChatProvider;
use crate::error::ChatError;
use crate::prompt::Persona;
use crate::tts::TextToSpeechProvider;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const MODEL: &str = "PERSONA_MODEL";
pub const SYSTEM_PROMPT: &str = "PERSONA_SYSTEM_PROMPT";
pub const TIMEOUT_SECONDS: &str = "PERSONA_TIMEOUT_SECONDS";
pub const TEMPERATURE: &str = "PERSONA_TEMPERATURE";
pub const MAX_TOKENS: &str = "PERSONA_MAX_TOKENS";
pub const TTS_PROVIDER: &str = "TTS_PROVIDER";
pub const FISH_AUDIO_API_KEY: &str = "FISH_AUDIO_API_KEY";
pub const FISH_REFERENCE_ID: &str = "RICK_MODEL_ID";
pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
pub const ELEVENLABS_VOICE_ID: &str = "ELEVENLABS_VOICE_ID";
pub const ELEVENLABS_MODEL_ID: &str = "ELEVENLABS_MODEL_ID";
pub const VOICE_OUTPUT_DIR: &str = "VOICE_OUTPUT_DIR";

/// Supported speech synthesis backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsBackend {
    #[default]
    FishAudio,
    ElevenLabs,
}

impl FromStr for TtsBackend {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fish" | "fish_audio" | "fishaudio" => Ok(TtsBackend::FishAudio),
            "elevenlabs" | "eleven_labs" => Ok(TtsBackend::ElevenLabs),
            other => Err(ChatError::ConfigError(format!(
                "Unknown TTS provider: {other}"
            ))),
        }
    }
}

/// Credentials and identifiers of the voice used to speak replies.
#[derive(Clone, PartialEq, Eq)]
pub enum VoiceConfig {
    FishAudio {
        api_key: String,
        reference_id: String,
    },
    ElevenLabs {
        api_key: String,
        voice_id: String,
        model_id: Option<String>,
    },
}

impl VoiceConfig {
    /// File name prefix for the artifacts this voice produces.
    pub fn artifact_prefix(&self) -> &'static str {
        match self {
            VoiceConfig::FishAudio { .. } => "fish_output",
            VoiceConfig::ElevenLabs { .. } => "elevenlabs_output",
        }
    }

    /// Builds the speech provider for this voice.
    pub fn provider(
        &self,
        timeout_seconds: Option<u64>,
    ) -> Result<Arc<dyn TextToSpeechProvider>, ChatError> {
        Ok(match self {
            VoiceConfig::FishAudio {
                api_key,
                reference_id,
            } => Arc::new(FishAudio::new(
                api_key.as_str(),
                reference_id.as_str(),
                None,
                timeout_seconds,
            )?),
            VoiceConfig::ElevenLabs {
                api_key,
                voice_id,
                model_id,
            } => Arc::new(ElevenLabs::new(
                api_key.as_str(),
                voice_id.as_str(),
                model_id.clone(),
                None,
                timeout_seconds,
            )?),
        })
    }
}

impl fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceConfig::FishAudio { reference_id, .. } => f
                .debug_struct("FishAudio")
                .field("api_key", &REDACTED)
                .field("reference_id", reference_id)
                .finish(),
            VoiceConfig::ElevenLabs {
                voice_id, model_id, ..
            } => f
                .debug_struct("ElevenLabs")
                .field("api_key", &REDACTED)
                .field("voice_id", voice_id)
                .field("model_id", model_id)
                .finish(),
        }
    }
}

const REDACTED: &str = "<redacted>";

/// Process-wide settings, constructed once and passed to whatever needs them.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub persona: Persona,
    pub timeout_seconds: Option<u64>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub output_dir: PathBuf,
    voice: Result<VoiceConfig, String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &REDACTED)
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("persona", &self.persona)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("output_dir", &self.output_dir)
            .field("voice", &self.voice)
            .finish()
    }
}

/// Parses an optional numeric variable, naming it in the error.
fn parse_number<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, ChatError> {
    raw.map(|raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|_| ChatError::ConfigError(format!("{key} must be a number, got '{raw}'")))
    })
    .transpose()
}

impl Config {
    /// Loads `.env` (overriding variables already set) and reads the process
    /// environment.
    pub fn from_env() -> Result<Self, ChatError> {
        match dotenvy::dotenv_override() {
            Ok(path) => log::debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ChatError::ConfigError(format!("cannot read .env: {e}"))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get(OPENAI_API_KEY)
            .ok_or_else(|| ChatError::ConfigError(format!("{OPENAI_API_KEY} is not set")))?;

        let persona = match get(SYSTEM_PROMPT) {
            Some(directive) => Persona::new(directive)?,
            None => Persona::default(),
        };

        let timeout_seconds = parse_number::<u64>(TIMEOUT_SECONDS, get(TIMEOUT_SECONDS))?;
        let temperature = parse_number::<f32>(TEMPERATURE, get(TEMPERATURE))?;
        let max_tokens = parse_number::<u32>(MAX_TOKENS, get(MAX_TOKENS))?;

        let backend = get(TTS_PROVIDER)
            .map(|raw| raw.parse::<TtsBackend>())
            .transpose()?
            .unwrap_or_default();

        let voice = match backend {
            TtsBackend::FishAudio => match (get(FISH_AUDIO_API_KEY), get(FISH_REFERENCE_ID)) {
                (Some(api_key), Some(reference_id)) => Ok(VoiceConfig::FishAudio {
                    api_key,
                    reference_id,
                }),
                (None, _) => Err(format!("{FISH_AUDIO_API_KEY} is not set")),
                (_, None) => Err(format!("{FISH_REFERENCE_ID} is not set")),
            },
            TtsBackend::ElevenLabs => match (get(ELEVENLABS_API_KEY), get(ELEVENLABS_VOICE_ID)) {
                (Some(api_key), Some(voice_id)) => Ok(VoiceConfig::ElevenLabs {
                    api_key,
                    voice_id,
                    model_id: get(ELEVENLABS_MODEL_ID),
                }),
                (None, _) => Err(format!("{ELEVENLABS_API_KEY} is not set")),
                (_, None) => Err(format!("{ELEVENLABS_VOICE_ID} is not set")),
            },
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: get(OPENAI_BASE_URL),
            model: get(MODEL).unwrap_or_else(|| OpenAI::DEFAULT_MODEL.to_string()),
            persona,
            timeout_seconds,
            temperature,
            max_tokens,
            output_dir: get(VOICE_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            voice,
        })
    }

    /// Voice settings, required only when replies are spoken.
    pub fn voice(&self) -> Result<&VoiceConfig, ChatError> {
        self.voice
            .as_ref()
            .map_err(|missing| ChatError::ConfigError(format!("voice output needs {missing}")))
    }

    /// Builds the chat-completion provider.
    pub fn chat_provider(&self) -> Result<Arc<dyn ChatProvider>, ChatError> {
        let mut llm = OpenAI::new(
            self.openai_api_key.as_str(),
            self.openai_base_url.clone(),
            Some(self.model.clone()),
            self.timeout_seconds,
        )?;
        if let Some(temperature) = self.temperature {
            llm = llm.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            llm = llm.with_max_tokens(max_tokens);
        }
        Ok(Arc::new(llm))
    }
}
