//! Memory retrieval for one turn: runs the strategies and merges their results.

use std::sync::Arc;

use memory_core::{MemoryCategory, MemoryStore, ScoredMemory, StrategyResult};
use memory_strategies::{merge_unique, ContextStrategy};
use tracing::{debug, info, instrument, warn};

/// Memories found for one message.
#[derive(Debug, Clone, Default)]
pub struct RetrievedMemories {
    pub targeted: usize,
    pub general: usize,
    /// De-duplicated by id, targeted results first.
    pub memories: Vec<ScoredMemory>,
}

impl RetrievedMemories {
    pub fn prompt_lines(&self) -> Vec<String> {
        self.memories
            .iter()
            .filter(|m| !m.entry.content.trim().is_empty())
            .map(|m| m.entry.to_prompt_line())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }
}

/// Runs retrieval strategies in order against one store.
pub struct MemoryRetriever {
    store: Arc<dyn MemoryStore>,
    strategies: Vec<Box<dyn ContextStrategy>>,
}

impl MemoryRetriever {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ContextStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// A failing strategy is logged and skipped; retrieval never fails the turn.
    #[instrument(skip(self, query), fields(strategy_count = self.strategies.len()))]
    pub async fn retrieve(&self, user_id: &str, query: &str) -> RetrievedMemories {
        let mut targeted = Vec::new();
        let mut general = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            match strategy.build_context(self.store.as_ref(), user_id, query).await {
                Ok(StrategyResult::Memories { category, memories }) => {
                    debug!(strategy = name, count = memories.len(), ?category, "Strategy returned memories");
                    match category {
                        MemoryCategory::Targeted => targeted.extend(memories),
                        MemoryCategory::General => general.extend(memories),
                    }
                }
                Ok(StrategyResult::Empty) => {
                    debug!(strategy = name, "Strategy returned no memories");
                }
                Err(e) => {
                    warn!(strategy = name, error = %e, "Memory strategy failed, continuing without it");
                }
            }
        }

        let targeted_count = targeted.len();
        let general_count = general.len();
        let memories = merge_unique([targeted, general]);

        info!(
            user_id = %user_id,
            targeted = targeted_count,
            general = general_count,
            merged = memories.len(),
            "step: retrieve_memories done"
        );

        RetrievedMemories {
            targeted: targeted_count,
            general: general_count,
            memories,
        }
    }
}
