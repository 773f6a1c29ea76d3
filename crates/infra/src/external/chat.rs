//! Chat completion pass-through.
//!
//! Posts a single user message (plus a fixed system prompt) to an
//! OpenAI-compatible completion endpoint and returns the first choice.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChatConfig;

const SYSTEM_PROMPT: &str = "You are a helpful assistant for a community sharing everyday life tips \
and local government support policies. Answer briefly and concretely.";

/// Upper bound on the error body kept for logs.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat is not configured")]
    NotConfigured,

    #[error("chat upstream returned {status}")]
    Upstream { status: u16, body: String },

    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat upstream returned an unexpected body: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Shared completion client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send `message` upstream and return the assistant's reply.
    pub async fn complete(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self.config.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let body = CompletionRequest {
            model: &self.config.model,
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: message,
                },
            ],
        };

        tracing::debug!(
            url = %self.config.api_url,
            model = %self.config.model,
            message_len = message.len(),
            "calling chat upstream"
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate(&mut body, MAX_ERROR_BODY);
            tracing::warn!(status = status.as_u16(), body = %body, "chat upstream error");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await?;
        extract_reply(&raw)
    }
}

/// Pull `choices[0].message.content` out of a completion body.
fn extract_reply(raw: &str) -> Result<String, ChatError> {
    let parsed: CompletionResponse =
        serde_json::from_str(raw).map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ChatError::MalformedResponse("no content in first choice".to_string()))
}

fn truncate(s: &mut String, max: usize) {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
}
