//! Memory storage trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::MemoryEntry;

/// Per-user memory storage with vector similarity search.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Short backend name for logs and health reports ("memory", "postgres").
    fn backend(&self) -> &'static str;

    async fn add(&self, entry: MemoryEntry) -> Result<(), anyhow::Error>;

    async fn get(&self, id: Uuid) -> Result<Option<MemoryEntry>, anyhow::Error>;

    /// Newest entries first, at most `limit`.
    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, anyhow::Error>;

    /// Top `limit` entries of `user_id` by cosine similarity, highest first.
    /// Entries stored without an embedding are never returned.
    async fn semantic_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        user_id: &str,
    ) -> Result<Vec<(f32, MemoryEntry)>, anyhow::Error>;

    /// Removes every entry of `user_id` and returns how many were removed.
    async fn delete_by_user(&self, user_id: &str) -> Result<usize, anyhow::Error>;
}
