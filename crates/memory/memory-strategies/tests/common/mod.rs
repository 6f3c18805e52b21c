//! Shared fixtures for strategy tests.

#![allow(dead_code)]

use async_trait::async_trait;
use embedding::{EmbeddingService, HashEmbedding};
use memory_core::{MemoryEntry, MemoryKind, MemoryMetadata, MemoryStore};

pub const DIM: usize = 64;

/// Embedding service that always fails.
pub struct FailingEmbeddingService;

#[async_trait]
impl EmbeddingService for FailingEmbeddingService {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Err(anyhow::anyhow!("embedding provider unavailable"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        Err(anyhow::anyhow!("embedding provider unavailable"))
    }
}

pub fn hash_embedding() -> HashEmbedding {
    HashEmbedding::new(DIM)
}

/// Adds an embedded memory and returns it.
pub async fn seed(store: &dyn MemoryStore, user_id: &str, content: &str) -> MemoryEntry {
    let entry = MemoryEntry::new(
        content.to_string(),
        MemoryMetadata::new(user_id, MemoryKind::Inferred),
    )
    .with_embedding(hash_embedding().embed_text(content));
    store.add(entry.clone()).await.unwrap();
    entry
}
