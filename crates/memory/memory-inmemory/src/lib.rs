//! In-memory implementation of the MemoryStore trait.
//!
//! Used for local development and tests, and whenever no `DATABASE_URL` is configured.
//! Contents are lost when the process exits.

use async_trait::async_trait;
use memory_core::{cosine_similarity, MemoryEntry, MemoryStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

type EntryMap = HashMap<Uuid, MemoryEntry>;

/// In-memory vector store.
#[derive(Debug, Clone)]
pub struct InMemoryVectorStore {
    entries: Arc<RwLock<EntryMap>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(EntryMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryVectorStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, entry: MemoryEntry) -> Result<(), anyhow::Error> {
        info!(
            id = %entry.id,
            user_id = %entry.metadata.user_id,
            kind = ?entry.metadata.kind,
            dimension = entry.embedding.as_ref().map(|e| e.len()).unwrap_or(0),
            "Writing memory to in-memory store"
        );
        let mut entries = self.entries.write().await;
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<MemoryEntry>, anyhow::Error> {
        let entries = self.entries.read().await;
        let result = entries.get(&id).cloned();
        info!(id = %id, found = result.is_some(), "In-memory store get returned");
        Ok(result)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, anyhow::Error> {
        let entries = self.entries.read().await;
        let mut results: Vec<MemoryEntry> = entries
            .values()
            .filter(|e| e.metadata.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        results.truncate(limit);
        info!(user_id = %user_id, count = results.len(), "In-memory store list_by_user returned");
        Ok(results)
    }

    async fn semantic_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        user_id: &str,
    ) -> Result<Vec<(f32, MemoryEntry)>, anyhow::Error> {
        info!(
            dimension = query_embedding.len(),
            limit,
            user_id = %user_id,
            "step: embedding InMemory semantic search"
        );
        let entries = self.entries.read().await;
        let mut similarities: Vec<(f32, MemoryEntry)> = entries
            .values()
            .filter(|entry| entry.metadata.user_id == user_id)
            .filter_map(|entry| {
                entry.embedding.as_ref().map(|embedding| {
                    (cosine_similarity(query_embedding, embedding), entry.clone())
                })
            })
            .collect();
        similarities.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        similarities.truncate(limit);
        info!(limit, count = similarities.len(), "step: embedding InMemory semantic search done");
        Ok(similarities)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<usize, anyhow::Error> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.metadata.user_id != user_id);
        let removed = before - entries.len();
        info!(user_id = %user_id, removed, "Deleted user memories from in-memory store");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use memory_core::{MemoryKind, MemoryMetadata};

    fn create_test_entry(content: &str, user_id: &str) -> MemoryEntry {
        MemoryEntry::new(
            content.to_string(),
            MemoryMetadata::new(user_id, MemoryKind::Inferred),
        )
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = InMemoryVectorStore::new();
        let entry = create_test_entry("Has a knee injury", "user123");
        store.add(entry.clone()).await.unwrap();
        let found = store.get(entry.id).await.unwrap();
        assert_eq!(found.unwrap().content, "Has a knee injury");
    }

    #[test]
    fn test_get_nonexistent() {
        let store = InMemoryVectorStore::new();
        let found = tokio_test::block_on(store.get(Uuid::new_v4())).unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_by_user_newest_first_with_limit() {
        let store = InMemoryVectorStore::new();
        let now = Utc::now();
        for (i, content) in ["oldest", "middle", "newest"].iter().enumerate() {
            let mut entry = create_test_entry(content, "user1");
            entry.metadata.created_at = now + Duration::seconds(i as i64);
            store.add(entry).await.unwrap();
        }
        store.add(create_test_entry("other user", "user2")).await.unwrap();

        let listed = store.list_by_user("user1", 2).await.unwrap();
        let contents: Vec<&str> = listed.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle"]);
    }

    #[tokio::test]
    async fn test_semantic_search_is_scoped_to_user_and_ranked() {
        let store = InMemoryVectorStore::new();
        store
            .add(create_test_entry("close", "user1").with_embedding(vec![1.0, 0.1, 0.0]))
            .await
            .unwrap();
        store
            .add(create_test_entry("far", "user1").with_embedding(vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();
        store
            .add(create_test_entry("no vector", "user1"))
            .await
            .unwrap();
        store
            .add(create_test_entry("other user", "user2").with_embedding(vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let results = store
            .semantic_search(&[1.0, 0.0, 0.0], 10, "user1")
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1.content, "close");
        assert_eq!(results[1].1.content, "far");
        assert!(results[0].0 > results[1].0);

        let limited = store
            .semantic_search(&[1.0, 0.0, 0.0], 1, "user1")
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let store = InMemoryVectorStore::new();
        store.add(create_test_entry("a", "user1")).await.unwrap();
        store.add(create_test_entry("b", "user1")).await.unwrap();
        store.add(create_test_entry("c", "user2")).await.unwrap();

        assert_eq!(store.delete_by_user("user1").await.unwrap(), 2);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.delete_by_user("user1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_len_and_clear() {
        let store = InMemoryVectorStore::new();
        assert!(store.is_empty().await);
        store.add(create_test_entry("Test", "user123")).await.unwrap();
        assert_eq!(store.len().await, 1);
        store.clear().await;
        assert!(store.is_empty().await);
    }
}
