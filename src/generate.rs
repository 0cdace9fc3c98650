//! Chat-completion client abstraction.
//!
//! Every pipeline stage that talks to the text-generation service goes
//! through the [`ChatClient`] trait, so stages can be exercised in tests
//! with a `mockall` mock instead of the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::GenerationConfig;

/// Leading-character window applied to every corpus sent to the service.
/// Lossy by design, to stay under request-size limits.
pub const CONTEXT_WINDOW_CHARS: usize = 6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug)]
pub enum GenerateError {
    /// No credential was configured; the call was refused at the point of use.
    MissingCredential,
    Transport(reqwest::Error),
    Api { status: u16, body: String },
    /// Response deserialized but carried no choices.
    EmptyResponse,
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::MissingCredential => {
                write!(f, "no API key configured for the chat-completion service")
            }
            GenerateError::Transport(e) => write!(f, "chat-completion request failed: {e}"),
            GenerateError::Api { status, body } => {
                write!(f, "chat-completion API returned status {status}: {body}")
            }
            GenerateError::EmptyResponse => {
                write!(f, "chat-completion response contained no choices")
            }
        }
    }
}

impl std::error::Error for GenerateError {}

/// Synchronous request/response collaborator; no streaming.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the ordered role-tagged messages and return the raw response text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerateError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenerateError::Transport)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GenerateError> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                error!("Chat-completion call attempted without an API key");
                return Err(GenerateError::MissingCredential);
            }
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequestBody {
            model: &self.model,
            messages: &messages,
            temperature: self.temperature,
        };
        info!(url = %url, model = %self.model, messages = messages.len(), "Sending chat-completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerateError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, body = %body, "Chat-completion API returned error");
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponseBody = response.json().await.map_err(GenerateError::Transport)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(GenerateError::EmptyResponse)?;

        debug!(chars = content.len(), "Received chat-completion response");
        Ok(content)
    }
}

/// Truncates to at most `max_chars` characters, on character boundaries.
/// Multi-byte text is never split mid-character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
