//! # Memory Strategies
//!
//! Strategies that pull memories out of a [`memory_core::MemoryStore`] for one turn.
//!
//! Available strategies:
//! - `SemanticSearchStrategy`: embeds the user's message and returns the most similar memories
//!   (targeted)
//! - `RecentMemoriesStrategy`: returns the user's newest memories regardless of the message
//!   (general)
//!
//! ## Logging
//!
//! Strategies emit `tracing` logs: retrieval path, score distribution and entry counts.
//! An embedding failure is a warning and yields `StrategyResult::Empty`; a store failure is
//! an error.

mod recent_memories;
mod semantic_search;
mod strategy;
mod utils;

pub use recent_memories::RecentMemoriesStrategy;
pub use semantic_search::SemanticSearchStrategy;
pub use strategy::ContextStrategy;
pub use utils::merge_unique;
