//! Process-local turn log. Lost on restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::models::ConversationTurn;
use crate::repository::TurnRepository;

#[derive(Clone, Default)]
pub struct InMemoryTurnRepository {
    turns: Arc<RwLock<Vec<ConversationTurn>>>,
}

impl InMemoryTurnRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }
}

#[async_trait]
impl TurnRepository for InMemoryTurnRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), StorageError> {
        self.turns.write().await.push(turn.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StorageError> {
        let turns = self.turns.read().await;
        let thread: Vec<&ConversationTurn> = turns
            .iter()
            .filter(|t| t.user_id == user_id && t.thread_id == thread_id)
            .collect();
        let skip = thread.len().saturating_sub(limit);
        Ok(thread.into_iter().skip(skip).cloned().collect())
    }

    async fn turns_by_user(&self, user_id: &str) -> Result<Vec<ConversationTurn>, StorageError> {
        Ok(self
            .turns
            .read()
            .await
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, StorageError> {
        let mut turns = self.turns.write().await;
        let before = turns.len();
        turns.retain(|t| t.user_id != user_id);
        Ok((before - turns.len()) as u64)
    }
}
