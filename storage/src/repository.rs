use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::ConversationTurn;

/// Append-only log of conversation turns, keyed by thread for resumption.
#[async_trait]
pub trait TurnRepository: Send + Sync {
    /// Short backend label for health reporting (`memory`, `postgres`).
    fn backend(&self) -> &'static str;

    async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), StorageError>;

    /// Last `limit` turns of one user's thread, oldest first. Turns another user wrote under
    /// the same thread id are never returned.
    async fn recent_turns(
        &self,
        user_id: &str,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StorageError>;

    /// All turns of a user across threads, oldest first.
    async fn turns_by_user(&self, user_id: &str) -> Result<Vec<ConversationTurn>, StorageError>;

    /// Removes every turn of a user; returns how many were removed.
    async fn delete_by_user(&self, user_id: &str) -> Result<u64, StorageError>;
}
