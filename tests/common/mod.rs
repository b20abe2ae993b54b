#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use futures::stream;
use persona_chat::async_trait;
use persona_chat::chat::{ChatMessage, ChatProvider, ChatResponse};
use persona_chat::tts::{AudioStream, TextToSpeechProvider};
use persona_chat::ChatError;
use tokio::sync::Notify;

#[derive(Debug)]
pub struct Reply(pub Option<String>);

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_deref().unwrap_or_default())
    }
}

impl ChatResponse for Reply {
    fn text(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Answers from a fixed script and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Option<String>, ChatError>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn reply(self, text: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(Some(text.to_string())));
        self
    }

    pub fn empty_reply(self) -> Self {
        self.script.lock().unwrap().push_back(Ok(None));
        self
    }

    pub fn fail(self, error: ChatError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, ChatError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::ProviderError("script exhausted".into())));
        next.map(|text| Box::new(Reply(text)) as Box<dyn ChatResponse>)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Holds every call open until the test releases it.
#[derive(Default)]
pub struct GatedProvider {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl ChatProvider for GatedProvider {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, ChatError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Box::new(Reply(Some("finally".into()))))
    }

    fn model(&self) -> &str {
        "gated"
    }
}

/// Speech provider returning fixed bytes, or failing when `fail` is set.
pub struct StubVoice {
    pub fail: bool,
}

#[async_trait]
impl TextToSpeechProvider for StubVoice {
    async fn speech_stream(&self, _text: &str) -> Result<AudioStream, ChatError> {
        if self.fail {
            return Err(ChatError::ProviderError("voice unavailable".into()));
        }
        let chunks: Vec<Result<Vec<u8>, ChatError>> = vec![Ok(b"ID3".to_vec()), Ok(b"mp3".to_vec())];
        Ok(Box::pin(stream::iter(chunks)))
    }

    fn voice(&self) -> &str {
        "stub"
    }
}
