//! Anthropic implementation of [`LlmClient`]: wraps anthropic-client and moves system
//! messages into the request's `system` field.

use std::time::Duration;

use anthropic_client::{AnthropicClient, Message, MessagesRequest, Role};
use anyhow::{Context, Result};
use async_trait::async_trait;
use prompt::{ChatMessage, MessageRole};
use tracing::instrument;

use crate::config::{split_model_and_provider, LlmConfig};
use crate::LlmClient;

/// LlmClient backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicLlmClient {
    client: AnthropicClient,
    has_api_key: bool,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl AnthropicLlmClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let has_api_key = !api_key.trim().is_empty();
        let client = AnthropicClient::new(api_key, base_url, timeout)
            .context("Failed to build Anthropic HTTP client")?;
        Ok(Self {
            client,
            has_api_key,
            model: split_model_and_provider(crate::DEFAULT_MODEL).model,
            max_tokens: 1024,
            temperature: None,
        })
    }

    /// Builds the client from config; the `provider/` prefix of the model is dropped.
    pub fn from_config(config: &dyn LlmConfig) -> Result<Self> {
        Ok(Self::new(
            config.api_key().to_string(),
            config.base_url(),
            Duration::from_secs(config.timeout_secs()),
        )?
        .with_model(split_model_and_provider(config.model()).model)
        .with_max_tokens(config.max_tokens()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Splits messages into the `system` text and the alternating `messages` array.
    /// Consecutive messages with the same role are merged; the array always starts with a
    /// user message.
    pub fn to_request_parts(messages: &[ChatMessage]) -> (Option<String>, Vec<Message>) {
        let system_parts: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        let mut out: Vec<Message> = Vec::new();
        for msg in messages.iter().filter(|m| m.role != MessageRole::System) {
            let role = match msg.role {
                MessageRole::Assistant => Role::Assistant,
                _ => Role::User,
            };
            if out.is_empty() && role == Role::Assistant {
                continue;
            }
            match out.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&msg.content);
                }
                _ => out.push(Message {
                    role,
                    content: msg.content.clone(),
                }),
            }
        }
        (system, out)
    }
}

#[async_trait]
impl LlmClient for AnthropicLlmClient {
    #[instrument(skip(self, messages), fields(model = %self.model, message_count = messages.len()))]
    async fn get_llm_response_with_messages(&self, messages: Vec<ChatMessage>) -> Result<String> {
        if !self.has_api_key {
            anyhow::bail!("ANTHROPIC_API_KEY not set");
        }
        let (system, messages) = Self::to_request_parts(&messages);
        if messages.is_empty() {
            anyhow::bail!("No user message to send");
        }
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages,
            temperature: self.temperature,
        };
        let reply = self.client.complete(&request).await?;
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
