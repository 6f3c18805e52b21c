//! # Text Embeddings
//!
//! This crate defines the embedding service interface for generating text embeddings,
//! its env-based configuration, and [`HashEmbedding`], a deterministic local embedder used
//! when no remote provider is configured.

use async_trait::async_trait;

mod config;
mod hash;

pub use config::{
    EmbeddingConfig, EnvEmbeddingConfig, EMBEDDING_PROVIDER_LOCAL, EMBEDDING_PROVIDER_OPENAI,
};
pub use hash::HashEmbedding;

/// Service for generating text embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;

    /// Generates embedding vectors for multiple texts in a single call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error>;
}
