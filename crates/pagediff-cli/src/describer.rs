//! HTTP client for the change-description service.
//!
//! Speaks the OpenAI-compatible chat-completions API. Failures are returned
//! as-is; retry policy is the caller's business.

use std::time::Duration;

use pagediff::ContentPart;
use serde::{Deserialize, Serialize};

use crate::config::DescriberConfig;

/// Errors from the description service.
#[derive(thiserror::Error, Debug)]
pub enum DescribeError {
    #[error("No API key configured (set PAGEDIFF_API_KEY)")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Description service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Description service returned no content")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a [ContentPart],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for the description service.
#[derive(Clone)]
pub struct DescriptionClient {
    client: reqwest::Client,
    config: DescriberConfig,
    api_key: String,
}

impl DescriptionClient {
    pub fn new(config: DescriberConfig, timeout: Duration) -> Result<Self, DescribeError> {
        let api_key = config.api_key.clone().ok_or(DescribeError::MissingApiKey)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    /// Send one user message and return the first choice's text.
    pub async fn describe(&self, content: &[ContentPart]) -> Result<String, DescribeError> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!("Requesting description ({} content parts)", content.len());
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DescribeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let choices = parsed.choices.len();
        let Some(text) = parsed.choices.into_iter().next().and_then(|c| c.message.content) else {
            tracing::warn!("Description response had no content ({choices} choices)");
            return Err(DescribeError::EmptyResponse);
        };
        if text.trim().is_empty() {
            tracing::warn!("Description service returned blank text");
        }
        Ok(text)
    }
}
