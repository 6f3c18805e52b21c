//! LLM configuration: trait and env-based implementation.

use anyhow::Result;
use std::env;

pub const DEFAULT_MODEL: &str = "anthropic/claude-3-5-sonnet-20240620";

/// Provider and model parsed from a `provider/model` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Option<String>,
    pub model: String,
}

/// Splits `"anthropic/claude-3-5-sonnet-20240620"` into provider and model.
/// A name without `/` has no provider.
pub fn split_model_and_provider(fully_specified_name: &str) -> ModelSpec {
    match fully_specified_name.split_once('/') {
        Some((provider, model)) => ModelSpec {
            provider: Some(provider.to_string()),
            model: model.to_string(),
        },
        None => ModelSpec {
            provider: None,
            model: fully_specified_name.to_string(),
        },
    }
}

/// LLM configuration interface for the Anthropic Messages API.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    /// Full `provider/model` string as configured.
    fn model(&self) -> &str;
    fn max_tokens(&self) -> u32;
    fn timeout_secs(&self) -> u64;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.anthropic_api_key
    }
    fn base_url(&self) -> &str {
        &self.anthropic_base_url
    }
    fn model(&self) -> &str {
        &self.llm_model
    }
    fn max_tokens(&self) -> u32 {
        self.llm_max_tokens
    }
    fn timeout_secs(&self) -> u64 {
        self.llm_timeout_secs
    }
}

impl EnvLlmConfig {
    /// Load from environment variables. A missing ANTHROPIC_API_KEY is allowed here (the
    /// service still starts and answers with fallback replies); callers warn about it.
    pub fn from_env() -> Result<Self> {
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let anthropic_base_url = env::var("ANTHROPIC_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| anthropic_client::DEFAULT_BASE_URL.to_string());
        let llm_model = env::var("MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let llm_max_tokens = env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1024);
        let llm_timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        Ok(Self {
            anthropic_api_key,
            anthropic_base_url,
            llm_model,
            llm_max_tokens,
            llm_timeout_secs,
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.anthropic_api_key.trim().is_empty()
    }

    /// Only the `anthropic` provider (or a bare model name) is supported.
    pub fn validate(&self) -> Result<()> {
        let spec = split_model_and_provider(&self.llm_model);
        if let Some(provider) = spec.provider.as_deref() {
            if provider != "anthropic" {
                anyhow::bail!(
                    "Unsupported model provider '{}' in MODEL={}, only 'anthropic' is supported",
                    provider,
                    self.llm_model
                );
            }
        }
        if spec.model.trim().is_empty() {
            anyhow::bail!("MODEL has an empty model name: {}", self.llm_model);
        }
        if self.llm_max_tokens == 0 {
            anyhow::bail!("LLM_MAX_TOKENS must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_BASE_URL",
            "MODEL",
            "LLM_MAX_TOKENS",
            "LLM_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_split_model_and_provider() {
        assert_eq!(
            split_model_and_provider("anthropic/claude-3-5-sonnet-20240620"),
            ModelSpec {
                provider: Some("anthropic".to_string()),
                model: "claude-3-5-sonnet-20240620".to_string(),
            }
        );
        assert_eq!(split_model_and_provider("claude-3-haiku").provider, None);
        assert_eq!(split_model_and_provider("a/b/c").model, "b/c");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = EnvLlmConfig::from_env().unwrap();
        assert!(!config.has_api_key());
        assert_eq!(config.base_url(), "https://api.anthropic.com/v1");
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.max_tokens(), 1024);
        assert_eq!(config.timeout_secs(), 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_validate_rejects_other_providers() {
        clear_env();
        env::set_var("MODEL", "openai/gpt-4o");
        let config = EnvLlmConfig::from_env().unwrap();
        assert!(config.validate().is_err());

        env::set_var("MODEL", "claude-3-haiku-20240307");
        env::set_var("LLM_MAX_TOKENS", "512");
        let config = EnvLlmConfig::from_env().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tokens(), 512);
        clear_env();
    }
}
