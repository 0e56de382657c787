use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{ports::ChatModel, DomainError};
use crate::infrastructure::config::LlmConfig;

/// OpenAI chat-completion client with the deployment's sampling settings.
pub struct OpenAiChatModel {
    client: openai::Client,
    model: String,
    max_tokens: u64,
    temperature: f64,
}

impl OpenAiChatModel {
    pub fn new(client: openai::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    pub fn from_config(client: openai::Client, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(system)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::chat_provider(e.to_string()))
    }
}
