//! General memories: the user's newest entries.

use async_trait::async_trait;
use memory_core::{MemoryCategory, MemoryStore, ScoredMemory, StrategyResult};
use tracing::{debug, error, info};

use super::strategy::ContextStrategy;

#[derive(Debug, Clone)]
pub struct RecentMemoriesStrategy {
    limit: usize,
}

impl RecentMemoriesStrategy {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

#[async_trait]
impl ContextStrategy for RecentMemoriesStrategy {
    fn name(&self) -> &str {
        "RecentMemories"
    }

    async fn build_context(
        &self,
        store: &dyn MemoryStore,
        user_id: &str,
        _query: &str,
    ) -> Result<StrategyResult, anyhow::Error> {
        if self.limit == 0 {
            debug!("RecentMemoriesStrategy: limit is 0, returning Empty");
            return Ok(StrategyResult::Empty);
        }

        let entries = store
            .list_by_user(user_id, self.limit)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "RecentMemoriesStrategy: list_by_user failed");
                e
            })?;

        info!(
            user_id = %user_id,
            entry_count = entries.len(),
            limit = self.limit,
            "RecentMemoriesStrategy: general memories"
        );

        if entries.is_empty() {
            return Ok(StrategyResult::Empty);
        }

        Ok(StrategyResult::Memories {
            category: MemoryCategory::General,
            memories: entries.into_iter().map(ScoredMemory::unscored).collect(),
        })
    }
}
