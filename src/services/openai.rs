// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAI chat-completions client for structured plan generation.
//!
//! Handles:
//! - JSON-object response format (structured output, not free text)
//! - Request timeouts
//! - Classifying failures as transient (retryable) or fatal

use crate::config::Config;
use crate::services::generator::{ModelError, ModelRequest, PlanModel, ResponseFormat};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,
    /// Message content
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

/// `response_format` request field.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormatParam {
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormatParam,
}

/// Chat completion response (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Error envelope returned by the API.
#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client from the process configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.openai_timeout)
            .build()?;

        tracing::info!(model = %config.openai_model, "OpenAI client initialized");

        Ok(Self {
            http,
            base_url: config.openai_api_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        })
    }

    /// Send one chat completion request.
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ModelError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport("Request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            let detail = format!("HTTP {}: {}", status.as_u16(), message);

            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("OpenAI rate limit hit (429)");
                return Err(ModelError::Transient(detail));
            }
            if status.is_server_error() {
                return Err(ModelError::Transient(detail));
            }
            return Err(ModelError::Fatal(detail));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport("Reading response failed", e))?;

        serde_json::from_slice(&body)
            .map_err(|e| ModelError::Fatal(format!("JSON parse error: {}", e)))
    }
}

/// Timeouts and connection failures are worth retrying; other transport
/// errors are not.
fn classify_transport(context: &str, e: reqwest::Error) -> ModelError {
    if e.is_timeout() || e.is_connect() {
        ModelError::Transient(format!("{}: {}", context, e))
    } else {
        ModelError::Fatal(format!("{}: {}", context, e))
    }
}

#[async_trait]
impl PlanModel for OpenAiClient {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String, ModelError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(request.system_prompt),
                ChatMessage::user(request.prompt),
            ],
            response_format: ResponseFormatParam {
                format_type: match request.response_format {
                    ResponseFormat::JsonObject => "json_object",
                },
            },
        };

        let completion = self.chat_completion(&body).await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Fatal("Response contained no choices".to_string()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            return Err(ModelError::Fatal(
                "Response was truncated at the token limit".to_string(),
            ));
        }

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ModelError::Fatal("Response contained no content".to_string()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
