use async_trait::async_trait;

use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider.
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
}

impl LLM {
    /// Build a client for the configured provider. An unknown provider name
    /// is a configuration error, caught before the research loop starts.
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Box<dyn LLMAdapter> = match provider.name.as_str() {
            "anthropic" => Box::new(crate::llm::anthropic::AnthropicAdapter::new(&provider.api_key)?),
            other => {
                return Err(AppError::Config(format!("Unsupported LLM provider: {}", other)));
            }
        };

        Ok(Self { adapter })
    }

    /// Wrap an already-constructed adapter. Used by tests to point the
    /// pipeline at a stub server.
    pub fn with_adapter(adapter: Box<dyn LLMAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
