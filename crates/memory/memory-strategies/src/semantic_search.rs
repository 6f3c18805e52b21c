//! Targeted memories: semantic search on the user's message.
//!
//! External interactions: EmbeddingService for the query vector; MemoryStore.semantic_search.

use std::sync::Arc;

use async_trait::async_trait;
use embedding::EmbeddingService;
use memory_core::{MemoryCategory, MemoryStore, ScoredMemory, StrategyResult};
use tracing::{debug, error, info, warn};

use super::strategy::ContextStrategy;
use super::utils::score_stats;

/// Embeds the message and returns the user's most similar memories.
///
/// Entries with score < `min_score` are dropped; 0.0 keeps everything the store returns.
pub struct SemanticSearchStrategy {
    limit: usize,
    min_score: f32,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SemanticSearchStrategy {
    pub fn new(limit: usize, embedding_service: Arc<dyn EmbeddingService>, min_score: f32) -> Self {
        Self {
            limit,
            min_score,
            embedding_service,
        }
    }
}

#[async_trait]
impl ContextStrategy for SemanticSearchStrategy {
    fn name(&self) -> &str {
        "SemanticSearch"
    }

    async fn build_context(
        &self,
        store: &dyn MemoryStore,
        user_id: &str,
        query: &str,
    ) -> Result<StrategyResult, anyhow::Error> {
        let query_text = query.trim();
        if query_text.is_empty() || self.limit == 0 {
            debug!("SemanticSearchStrategy: no query text or zero limit, skipping");
            return Ok(StrategyResult::Empty);
        }

        let query_embedding = match self.embedding_service.embed(query_text).await {
            Ok(emb) => {
                debug!(dimension = emb.len(), "SemanticSearchStrategy: query embedded");
                emb
            }
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "SemanticSearchStrategy: embedding failed, skipping semantic search");
                return Ok(StrategyResult::Empty);
            }
        };

        let scored_entries = store
            .semantic_search(&query_embedding, self.limit, user_id)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, limit = self.limit, "SemanticSearchStrategy: semantic_search failed");
                anyhow::anyhow!("SemanticSearchStrategy semantic_search failed: {}", e)
            })?;

        let scores: Vec<f32> = scored_entries.iter().map(|(s, _)| *s).collect();
        if let Some((min, mean, max)) = score_stats(&scores) {
            info!(
                count = scores.len(),
                score_min = %min,
                score_mean = %mean,
                score_max = %max,
                "SemanticSearchStrategy: score distribution"
            );
        }

        let count_before = scored_entries.len();
        let memories: Vec<ScoredMemory> = scored_entries
            .into_iter()
            .filter(|(score, _)| *score >= self.min_score)
            .map(|(score, entry)| ScoredMemory::scored(score, entry))
            .collect();

        if count_before > 0 && memories.is_empty() {
            warn!(
                min_score = self.min_score,
                count_before,
                "SemanticSearchStrategy: all results below threshold"
            );
        }

        info!(
            user_id = %user_id,
            entry_count = memories.len(),
            "SemanticSearchStrategy: targeted memories"
        );

        if memories.is_empty() {
            return Ok(StrategyResult::Empty);
        }

        Ok(StrategyResult::Memories {
            category: MemoryCategory::Targeted,
            memories,
        })
    }
}
