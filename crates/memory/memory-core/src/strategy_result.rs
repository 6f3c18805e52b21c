//! Result type for retrieval strategies.

use crate::types::ScoredMemory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryCategory {
    /// Found by similarity to the current message.
    Targeted,
    /// Newest memories regardless of the message.
    General,
}

#[derive(Debug, Clone)]
pub enum StrategyResult {
    Memories {
        category: MemoryCategory,
        memories: Vec<ScoredMemory>,
    },
    Empty,
}

impl StrategyResult {
    pub fn into_memories(self) -> Vec<ScoredMemory> {
        match self {
            StrategyResult::Memories { memories, .. } => memories,
            StrategyResult::Empty => Vec::new(),
        }
    }
}
