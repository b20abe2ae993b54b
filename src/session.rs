//! A single conversation with the persona.

use std::sync::Arc;

use crate::chat::{ChatProvider, History, Turn};
use crate::error::ChatError;
use crate::prompt::{self, Persona};

/// Inputs that end a session, compared case-insensitively after trimming.
pub const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "bye"];

/// Returns true when `input` asks to end the session.
pub fn is_exit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&normalized.as_str())
}

/// Where a session is in its input/reply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    AwaitingReply,
}

/// Owns the history of one conversation and drives each round-trip to the
/// completion provider.
///
/// A turn is recorded only once the provider has answered with text. Any
/// failure leaves the history exactly as it was, so the same input can be
/// retried.
pub struct Session {
    persona: Persona,
    provider: Arc<dyn ChatProvider>,
    history: History,
    state: SessionState,
}

impl Session {
    pub fn new(persona: Persona, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            persona,
            provider,
            history: History::new(),
            state: SessionState::AwaitingInput,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Sends `input` with the full conversation so far and returns the reply.
    pub async fn submit(&mut self, input: &str) -> Result<String, ChatError> {
        let messages = prompt::assemble(&self.persona, &self.history, input);
        log::debug!(
            "submitting {} messages to {} ({} past turns)",
            messages.len(),
            self.provider.model(),
            self.history.len()
        );

        let provider = Arc::clone(&self.provider);
        let result = {
            let _pending = Pending::enter(&mut self.state);
            provider.chat(&messages).await
        };

        let response = result?;
        let reply = response.text().ok_or_else(|| ChatError::ResponseFormatError {
            message: "completion contained no text".into(),
            raw_response: response.to_string(),
        })?;

        if let Some(usage) = response.usage() {
            log::debug!(
                "usage: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        self.history.push(Turn::new(input, reply.clone()));
        Ok(reply)
    }

    /// Discards the conversation, as if a new session had started.
    pub fn reset(&mut self) {
        log::debug!("discarding {} turns", self.history.len());
        self.history = History::new();
    }
}

/// Holds a session in `AwaitingReply` for as long as the provider call is
/// alive, including when the call's future is dropped mid-flight.
struct Pending<'a>(&'a mut SessionState);

impl<'a> Pending<'a> {
    fn enter(state: &'a mut SessionState) -> Self {
        *state = SessionState::AwaitingReply;
        Self(state)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        *self.0 = SessionState::AwaitingInput;
    }
}
