//! OpenAI chat-completion client
//!
//! Works against any OpenAI-compatible `/chat/completions` endpoint; the base
//! URL can be overridden for proxies and self-hosted gateways.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::backends::parse_base_url;
use crate::chat::{ChatMessage, ChatProvider, ChatResponse, Usage};
use crate::error::ChatError;

/// OpenAI chat-completion backend
pub struct OpenAI {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub client: Client,
}

impl OpenAI {
    pub const PROVIDER_NAME: &'static str = "OpenAI";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1/";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    const CHAT_ENDPOINT: &'static str = "chat/completions";

    /// Creates a new OpenAI client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token sent with every request
    /// * `base_url` - Endpoint root, defaults to the public OpenAI API
    /// * `model` - Model identifier, defaults to `gpt-4o-mini`
    /// * `timeout_seconds` - Optional per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }

        Ok(Self {
            api_key: api_key.into(),
            base_url: parse_base_url(base_url.as_deref().unwrap_or(Self::DEFAULT_BASE_URL))?,
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            max_tokens: None,
            temperature: None,
            timeout_seconds,
            client: builder.build()?,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Serialize, Debug)]
struct OpenAIChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct OpenAIChatResponse {
    pub choices: Vec<OpenAIChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAIChatChoice {
    pub message: OpenAIChatMsg,
}

#[derive(Deserialize, Debug)]
pub struct OpenAIChatMsg {
    pub role: String,
    pub content: Option<String>,
}

impl ChatResponse for OpenAIChatResponse {
    fn text(&self) -> Option<String> {
        self.choices.first().and_then(|c| c.message.content.clone())
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.clone()
    }
}

impl std::fmt::Display for OpenAIChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.choices.first().and_then(|c| c.message.content.as_deref()) {
            Some(content) => write!(f, "{content}"),
            None => write!(f, ""),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, ChatError> {
        if self.api_key.is_empty() {
            return Err(ChatError::AuthError(format!(
                "Missing {} API key",
                Self::PROVIDER_NAME
            )));
        }

        let body = OpenAIChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| OpenAIChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let url = self
            .base_url
            .join(Self::CHAT_ENDPOINT)
            .map_err(|e| ChatError::HttpError(e.to_string()))?;

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("{} request payload: {}", Self::PROVIDER_NAME, json);
            }
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        log::debug!("{} HTTP status: {}", Self::PROVIDER_NAME, response.status());

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(ChatError::ResponseFormatError {
                message: format!("{} API returned error status: {status}", Self::PROVIDER_NAME),
                raw_response: error_text,
            });
        }

        let resp_text = response.text().await?;
        let json_resp: Result<OpenAIChatResponse, serde_json::Error> =
            serde_json::from_str(&resp_text);

        match json_resp {
            Ok(response) => Ok(Box::new(response)),
            Err(e) => Err(ChatError::ResponseFormatError {
                message: format!("Failed to decode {} API response: {e}", Self::PROVIDER_NAME),
                raw_response: resp_text,
            }),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
