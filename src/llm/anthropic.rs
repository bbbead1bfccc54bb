//! Anthropic Messages API adapter
//!
//! Plain `reqwest` client against `POST /v1/messages`. The base URL is
//! overridable so tests can stand in a local stub server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: &str) -> AppResult<Self> {
        Self::with_base_url(api_key, ANTHROPIC_API_BASE)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LLMAdapter for AnthropicAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let wire_request = MessagesRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.clone(),
                    content: m.content.clone(),
                })
                .collect(),
            system: request.system_instruction.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(model = %request.model, max_tokens = request.max_tokens, "Sending Anthropic request");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Request to Anthropic API failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::LLMApi(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let wire_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Anthropic response: {}", e)))?;

        let content = wire_response
            .content
            .iter()
            .filter_map(|block| {
                if block.block_type == "text" {
                    block.text.as_deref()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = wire_response.usage.unwrap_or_default();

        Ok(LLMResponse {
            content,
            finish_reason: wire_response.stop_reason.unwrap_or_else(|| "stop".to_string()),
            usage: TokenUsage {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage.input_tokens + usage.output_tokens,
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "claude-3-haiku-20240307".to_string(),
            messages: vec![LLMMessage::user("hello")],
            max_tokens: 64,
            temperature: None,
            system_instruction: None,
        }
    }

    #[tokio::test]
    async fn parses_a_messages_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"hi there"}],"stop_reason":"end_turn","usage":{"input_tokens":10,"output_tokens":4}}"#,
            )
            .create_async()
            .await;

        let adapter = AnthropicAdapter::with_base_url("test-key", &server.url()).unwrap();
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        assert_eq!(response.content, "hi there");
        assert_eq!(response.finish_reason, "end_turn");
        assert_eq!(response.usage.total_tokens, 14);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn joins_multiple_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"part one "},{"type":"tool_use"},{"type":"text","text":"part two"}]}"#,
            )
            .create_async()
            .await;

        let adapter = AnthropicAdapter::with_base_url("k", &server.url()).unwrap();
        let response = adapter.create_chat_completion(&request()).await.unwrap();
        assert_eq!(response.content, "part one part two");
    }

    #[tokio::test]
    async fn surfaces_api_errors_as_llm_api() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(500)
            .with_body("overloaded")
            .create_async()
            .await;

        let adapter = AnthropicAdapter::with_base_url("k", &server.url()).unwrap();
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::LLMApi(_)));
    }
}
