//! Embedding configuration: trait and env-based implementation.

use anyhow::Result;
use std::env;

pub const EMBEDDING_PROVIDER_OPENAI: &str = "openai";
pub const EMBEDDING_PROVIDER_LOCAL: &str = "local";

/// Embedding service configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    /// "openai" or "local".
    fn provider(&self) -> &str;
    /// API key for OpenAI-compatible embedding (OPENAI_API_KEY). Used when provider is openai.
    fn openai_api_key(&self) -> &str;
    /// Optional base URL for OpenAI-compatible embedding (OPENAI_BASE_URL).
    fn openai_base_url(&self) -> Option<&str>;
    fn model(&self) -> &str;
    /// Vector size; sizes the pgvector column and the local embedder.
    fn dimension(&self) -> usize;
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvEmbeddingConfig {
    pub embedding_provider: String,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub embedding_model: String,
    pub embedding_dimension: usize,
}

impl EmbeddingConfig for EnvEmbeddingConfig {
    fn provider(&self) -> &str {
        &self.embedding_provider
    }
    fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }
    fn openai_base_url(&self) -> Option<&str> {
        self.openai_base_url.as_deref().filter(|s| !s.is_empty())
    }
    fn model(&self) -> &str {
        &self.embedding_model
    }
    fn dimension(&self) -> usize {
        self.embedding_dimension
    }
}

impl EnvEmbeddingConfig {
    /// Load from environment variables. Provider defaults to openai when OPENAI_API_KEY is
    /// set, otherwise local.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let embedding_provider = env::var("EMBEDDING_PROVIDER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| {
                if openai_api_key.is_empty() {
                    EMBEDDING_PROVIDER_LOCAL.to_string()
                } else {
                    EMBEDDING_PROVIDER_OPENAI.to_string()
                }
            });
        let openai_base_url = env::var("OPENAI_BASE_URL").ok().filter(|s| !s.trim().is_empty());
        let embedding_model =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
        let embedding_dimension = env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1536);
        Ok(Self {
            embedding_provider,
            openai_api_key,
            openai_base_url,
            embedding_model,
            embedding_dimension,
        })
    }

    /// Validate config (known provider, openai requires OPENAI_API_KEY, non-zero dimension).
    pub fn validate(&self) -> Result<()> {
        match self.embedding_provider.as_str() {
            EMBEDDING_PROVIDER_OPENAI => {
                if self.openai_api_key.is_empty() {
                    anyhow::bail!("EMBEDDING_PROVIDER=openai requires OPENAI_API_KEY to be set");
                }
            }
            EMBEDDING_PROVIDER_LOCAL => {}
            other => anyhow::bail!(
                "Unknown EMBEDDING_PROVIDER '{}', expected 'openai' or 'local'",
                other
            ),
        }
        if self.embedding_dimension == 0 {
            anyhow::bail!("EMBEDDING_DIMENSION must be greater than 0");
        }
        Ok(())
    }
}
