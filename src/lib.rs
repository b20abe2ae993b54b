//! persona-chat talks to a fictional character through a hosted chat-completion API.
//!
//! # Overview
//! A fixed persona directive is placed in front of the conversation so far and the
//! whole message list is sent to the provider on every turn. Replies can be:
//!
//! - printed in an interactive terminal loop
//! - shown in a browser chat page (feature `api`)
//! - spoken through a hosted text-to-speech API, saved as MP3 and played locally
//!
//! # Architecture
//! [`prompt::assemble`] is the pure core. [`session::Session`] owns the history and
//! records a turn only after a reply actually arrived; everything else is a thin
//! client around an external service.

// Re-export for convenience
pub use async_trait::async_trait;

/// Backend implementations for the chat and speech providers
pub mod backends;

/// Chat messages, turns and the provider trait
pub mod chat;

/// Startup configuration from the environment
pub mod config;

/// Error types and handling
pub mod error;

/// Local playback of synthesized speech
pub mod playback;

/// Assembly of the message list sent to the provider
pub mod prompt;

/// The conversation state machine
pub mod session;

/// Text-to-speech support
pub mod tts;

#[cfg(feature = "api")]
pub mod api;

pub use chat::{ChatMessage, ChatProvider, ChatRole, History, Turn};
pub use error::ChatError;
pub use prompt::{assemble, Persona};
pub use session::{is_exit_command, Session, SessionState};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
