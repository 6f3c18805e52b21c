//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait and an Anthropic implementation. Transport-agnostic;
//! the agent only sees [`ChatMessage`] lists and reply strings.

use anyhow::Result;
use async_trait::async_trait;
use prompt::ChatMessage;

mod anthropic_llm;
mod config;

pub use anthropic_llm::AnthropicLlmClient;
pub use config::{split_model_and_provider, EnvLlmConfig, LlmConfig, ModelSpec, DEFAULT_MODEL};

/// LLM client interface: request a completion for a list of messages.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the model reply text for the given messages (system/user/assistant).
    async fn get_llm_response_with_messages(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Model name for logs and health reports.
    fn model_name(&self) -> &str;
}
