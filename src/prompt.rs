//! Turns a persona, the turns so far and a new user input into the message
//! list a chat-completion call expects.

use std::fmt;

use crate::chat::{ChatMessage, History};
use crate::error::ChatError;

/// Persona used when no system prompt is configured.
pub const DEFAULT_PERSONA: &str = "You are Rick Sanchez from Rick and Morty, the smartest man in the multiverse. \
Speak like Rick: you're a fast-talking, sarcastic, and genius-level scientist who mixes high-level science talk \
with irreverent remarks. You are brutally honest, a bit nihilistic, and constantly annoyed by stupidity, but you \
secretly enjoy intelligent conversation and mentoring those who can keep up. Use colloquial language like \
'Morty', 'science-y stuff' and 'multiverse crap' (keep it PG-13). Break the fourth wall occasionally. \
Never act too robotic: you're unpredictable and chaotic, but always sharp. \
Move the conversation forward and give colloquial answers, no more than 3 sentences. \
You are currently trapped inside a poster on the user's wall; you can see the user but cannot leave the poster. \
Don't burp and don't write anything in asterisks.";

/// The fixed system directive that establishes the character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona(String);

impl Persona {
    /// Wraps a system directive. Blank directives are rejected.
    pub fn new(directive: impl Into<String>) -> Result<Self, ChatError> {
        let directive = directive.into();
        if directive.trim().is_empty() {
            return Err(ChatError::ConfigError(
                "persona directive must not be empty".into(),
            ));
        }
        Ok(Self(directive))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self(DEFAULT_PERSONA.to_string())
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the ordered message list for one completion call.
///
/// The result is always `[system, (user, assistant)*, user]`: the persona,
/// every past turn in chronological order, then `input` verbatim. Empty or
/// whitespace-only input is forwarded unchanged.
pub fn assemble(persona: &Persona, history: &History, input: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + 2 * history.len());
    messages.push(ChatMessage::system().content(persona.as_str()).build());

    for turn in history {
        messages.push(ChatMessage::user().content(turn.user()).build());
        messages.push(ChatMessage::assistant().content(turn.assistant()).build());
    }

    messages.push(ChatMessage::user().content(input).build());
    messages
}
