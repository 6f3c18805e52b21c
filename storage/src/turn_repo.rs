//! PostgreSQL turn repository.
//!
//! Table `conversation_turns`, created on construction if missing.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::ConversationTurn;
use crate::pg_pool::PgPoolManager;
use crate::repository::TurnRepository;

#[derive(Clone)]
pub struct PgTurnRepository {
    pool_manager: PgPoolManager,
}

impl PgTurnRepository {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool_manager = PgPoolManager::new(database_url, max_connections).await?;
        Self::with_pool_manager(pool_manager).await
    }

    /// Shares an existing pool (e.g. the memory store's).
    pub async fn with_pool_manager(pool_manager: PgPoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating conversation_turns table if not exists");
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_turns (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                thread_id TEXT NOT NULL,
                user_message TEXT NOT NULL,
                assistant_reply TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                latency_ms BIGINT NOT NULL,
                fallback BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(pool)
        .await?;

        for ddl in [
            "CREATE INDEX IF NOT EXISTS idx_turns_user_id ON conversation_turns(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_turns_user_thread ON conversation_turns(user_id, thread_id)",
            "CREATE INDEX IF NOT EXISTS idx_turns_created_at ON conversation_turns(created_at)",
        ] {
            sqlx::query(ddl).execute(pool).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl TurnRepository for PgTurnRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_turns
                (id, user_id, thread_id, user_message, assistant_reply, created_at, latency_ms, fallback)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(turn.id)
        .bind(&turn.user_id)
        .bind(&turn.thread_id)
        .bind(&turn.user_message)
        .bind(&turn.assistant_reply)
        .bind(turn.created_at)
        .bind(turn.latency_ms)
        .bind(turn.fallback)
        .execute(self.pool_manager.pool())
        .await?;

        debug!(turn_id = %turn.id, thread_id = %turn.thread_id, "Saved conversation turn");
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StorageError> {
        let turns = sqlx::query_as::<_, ConversationTurn>(
            r#"
            SELECT * FROM (
                SELECT * FROM conversation_turns
                WHERE user_id = $1 AND thread_id = $2
                ORDER BY created_at DESC
                LIMIT $3
            ) recent
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(thread_id)
        .bind(limit as i64)
        .fetch_all(self.pool_manager.pool())
        .await?;

        debug!(user_id = %user_id, thread_id = %thread_id, count = turns.len(), "Loaded recent turns");
        Ok(turns)
    }

    async fn turns_by_user(&self, user_id: &str) -> Result<Vec<ConversationTurn>, StorageError> {
        let turns = sqlx::query_as::<_, ConversationTurn>(
            "SELECT * FROM conversation_turns WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(turns)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM conversation_turns WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool_manager.pool())
            .await?;

        info!(user_id = %user_id, deleted = result.rows_affected(), "Deleted conversation turns");
        Ok(result.rows_affected())
    }
}
