//! Retrieval strategy trait.

use async_trait::async_trait;
use memory_core::{MemoryStore, StrategyResult};

#[async_trait]
pub trait ContextStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn build_context(
        &self,
        store: &dyn MemoryStore,
        user_id: &str,
        query: &str,
    ) -> Result<StrategyResult, anyhow::Error>;
}
