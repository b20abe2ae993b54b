use std::fmt;

/// Error types that can occur while running a persona chat session.
#[derive(Debug)]
pub enum ChatError {
    /// Missing or invalid startup configuration
    ConfigError(String),
    /// HTTP request/response errors
    HttpError(String),
    /// Authentication and authorization errors
    AuthError(String),
    /// Errors returned by a provider or a local collaborator
    ProviderError(String),
    /// The provider answered, but not with something usable
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    JsonError(String),
    /// Writing or playing a synthesized audio artifact failed
    AudioError(String),
    /// A submission arrived while another one was still awaiting its reply
    SessionBusy,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::ConfigError(e) => write!(f, "Configuration Error: {e}"),
            ChatError::HttpError(e) => write!(f, "HTTP Error: {e}"),
            ChatError::AuthError(e) => write!(f, "Auth Error: {e}"),
            ChatError::ProviderError(e) => write!(f, "Provider Error: {e}"),
            ChatError::ResponseFormatError {
                message,
                raw_response,
            } => write!(f, "Response Format Error: {message}. Raw response: {raw_response}"),
            ChatError::JsonError(e) => write!(f, "JSON Parse Error: {e}"),
            ChatError::AudioError(e) => write!(f, "Audio Error: {e}"),
            ChatError::SessionBusy => write!(f, "Session is still waiting for the previous reply"),
        }
    }
}

impl std::error::Error for ChatError {}

/// Converts reqwest HTTP errors into ChatErrors
impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::JsonError(format!(
            "{} at line {} column {}",
            err, err.line(), err.column()
        ))
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::AudioError(err.to_string())
    }
}
