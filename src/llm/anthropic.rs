// ABOUTME: Anthropic summarizer provider implementation via the Messages API
// ABOUTME: Submits system-instructed conversations and returns plain prose completions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Anthropic Provider
//!
//! Implementation of the [`LlmProvider`] trait against the Anthropic
//! Messages API.
//!
//! ## Configuration
//!
//! Set the `ANTHROPIC_API_KEY` environment variable. The model defaults
//! to the Claude Sonnet family and can be overridden via
//! `COSTWISE_SUMMARIZER_MODEL`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, MessageRole, TokenUsage,
};
use crate::constants::{defaults, env_vars};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Service name used in error messages
const SERVICE: &str = "summarizer";

/// Messages API version header value
const API_VERSION: &str = "2023-06-01";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for AnthropicMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    model: String,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(rename = "input_tokens")]
    input: u32,
    #[serde(rename = "output_tokens")]
    output: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorEnvelope {
    #[serde(default)]
    error: Option<AnthropicErrorBody>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Summarizer provider backed by the Anthropic Messages API
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl AnthropicProvider {
    /// Create a provider with an explicit API key and model
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: defaults::SUMMARIZER_BASE_URL.to_owned(),
            api_key: api_key.into(),
            default_model: model.into(),
        }
    }

    /// Create a provider from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error when `ANTHROPIC_API_KEY` is not set.
    pub fn from_env() -> AppResult<Self> {
        let api_key = std::env::var(env_vars::ANTHROPIC_API_KEY)
            .map_err(|_| AppError::new(
                ErrorCode::ConfigMissing,
                format!("{} is not set", env_vars::ANTHROPIC_API_KEY),
            ))?;
        let model = std::env::var(env_vars::SUMMARIZER_MODEL)
            .unwrap_or_else(|_| defaults::SUMMARIZER_MODEL.to_owned());
        Ok(Self::new(api_key, model))
    }

    /// Override the API base URL (self-hosted gateways, test servers)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Split system instructions from conversational messages; the
    /// Messages API carries the system prompt in a dedicated field.
    fn split_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts = Vec::new();
        let mut turns = Vec::new();
        for message in messages {
            if message.role == MessageRole::System {
                system_parts.push(message.content.clone());
            } else {
                turns.push(AnthropicMessage::from(message));
            }
        }
        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, turns)
    }

    fn status_error(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<AnthropicErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .map_or_else(
                || body.to_owned(),
                |e| format!("{}: {}", e.error_type, e.message),
            );
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::external_auth(SERVICE, detail)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                AppError::new(ErrorCode::ExternalRateLimited, format!("{SERVICE}: {detail}"))
            }
            s if s.is_server_error() => AppError::external_unavailable(SERVICE, detail),
            _ => AppError::external_service(SERVICE, detail),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn display_name(&self) -> &'static str {
        "Anthropic Claude"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::SYSTEM_MESSAGES | LlmCapabilities::STREAMING
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let (system, messages) = Self::split_messages(&request.messages);
        let body = AnthropicRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            max_tokens: request.max_tokens.unwrap_or(defaults::SUMMARIZER_MAX_TOKENS),
            system,
            messages,
            temperature: request.temperature,
        };
        debug!(model = body.model, turns = body.messages.len(), "summarizer call");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "summarizer call failed");
            return Err(Self::status_error(status, &detail));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::invalid_format(format!("{SERVICE} response: {e}")))?;

        let content = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(AppError::invalid_format(format!(
                "{SERVICE} response carried no text content"
            )));
        }

        Ok(ChatResponse {
            content,
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt: u.input,
                completion: u.output,
            }),
        })
    }
}
