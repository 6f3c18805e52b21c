//! PostgreSQL implementation of the MemoryStore trait.
//!
//! Embeddings live in a pgvector `vector(D)` column and similarity search runs in the
//! database with the cosine distance operator (`<=>`). Vectors cross the wire in their
//! text form (`[0.1,0.2,...]`) and are cast with `::vector`, so no client-side pgvector
//! type is needed.
//!
//! # External Interactions
//!
//! - **PostgreSQL**: requires the `vector` extension to be installable by the connecting
//!   role (`CREATE EXTENSION IF NOT EXISTS vector` runs on startup).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::{MemoryEntry, MemoryKind, MemoryMetadata, MemoryStore};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

/// PostgreSQL-backed vector store for persistent memory storage.
#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
    dimension: usize,
}

impl PgVectorStore {
    /// Connects, then creates the extension, table and indexes if missing.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        dimension: usize,
    ) -> Result<Self, anyhow::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::with_pool(pool, dimension).await
    }

    /// Uses an existing pool (shared with the conversation store).
    pub async fn with_pool(pool: PgPool, dimension: usize) -> Result<Self, anyhow::Error> {
        if dimension == 0 {
            anyhow::bail!("embedding dimension must be greater than 0");
        }
        let store = Self { pool, dimension };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), anyhow::Error> {
        info!(dimension = self.dimension, "Creating memories table if not exist");
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        // Column type carries the dimension, so it cannot be a bind parameter.
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                context TEXT,
                kind TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                embedding vector({})
            )
            "#,
            self.dimension
        );
        sqlx::query(&create_table).execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_memories_user_id ON memories(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_embedding ON memories \
             USING hnsw (embedding vector_cosine_ops)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_entry(row: &PgRow) -> Result<MemoryEntry, sqlx::Error> {
        let id: Uuid = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let content: String = row.try_get("content")?;
        let context: Option<String> = row.try_get("context")?;
        let kind_str: String = row.try_get("kind")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let embedding_text: Option<String> = row.try_get("embedding_text")?;

        let kind = MemoryKind::parse(&kind_str).ok_or_else(|| {
            sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid memory kind: {}", kind_str),
            )))
        })?;
        let embedding = embedding_text
            .map(|text| parse_vector(&text))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(MemoryEntry {
            id,
            content,
            context,
            embedding,
            metadata: MemoryMetadata {
                user_id,
                kind,
                created_at,
            },
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, user_id, content, context, kind, created_at, embedding::text AS embedding_text";

/// pgvector text literal: `[0.1,0.2,0.3]`.
pub fn format_vector(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Parses the pgvector text form back into floats.
pub fn parse_vector(text: &str) -> Result<Vec<f32>, anyhow::Error> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| anyhow::anyhow!("Invalid vector literal: {}", text))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| anyhow::anyhow!("Invalid vector component {:?}: {}", part, e))
        })
        .collect()
}

#[async_trait]
impl MemoryStore for PgVectorStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn add(&self, entry: MemoryEntry) -> Result<(), anyhow::Error> {
        if let Some(ref embedding) = entry.embedding {
            if embedding.len() != self.dimension {
                anyhow::bail!(
                    "Embedding dimension {} does not match store dimension {}",
                    embedding.len(),
                    self.dimension
                );
            }
        }
        info!(
            id = %entry.id,
            user_id = %entry.metadata.user_id,
            kind = ?entry.metadata.kind,
            has_embedding = entry.embedding.is_some(),
            "Writing memory to PostgreSQL store"
        );
        let embedding_text = entry.embedding.as_deref().map(format_vector);
        sqlx::query(
            r#"
            INSERT INTO memories (id, user_id, content, context, kind, created_at, embedding)
            VALUES ($1, $2, $3, $4, $5, $6, $7::vector)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.metadata.user_id)
        .bind(&entry.content)
        .bind(&entry.context)
        .bind(entry.metadata.kind.as_str())
        .bind(entry.metadata.created_at)
        .bind(embedding_text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<MemoryEntry>, anyhow::Error> {
        let sql = format!("SELECT {} FROM memories WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        info!(id = %id, found = row.is_some(), "PostgreSQL store get returned");
        match row {
            Some(r) => Ok(Some(Self::row_to_entry(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, anyhow::Error> {
        let sql = format!(
            "SELECT {} FROM memories WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        let entries = rows
            .iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        info!(user_id = %user_id, count = entries.len(), "PostgreSQL store list_by_user returned");
        Ok(entries)
    }

    async fn semantic_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        user_id: &str,
    ) -> Result<Vec<(f32, MemoryEntry)>, anyhow::Error> {
        if query_embedding.len() != self.dimension {
            anyhow::bail!(
                "Query dimension {} does not match store dimension {}",
                query_embedding.len(),
                self.dimension
            );
        }
        info!(
            dimension = query_embedding.len(),
            limit,
            user_id = %user_id,
            "step: embedding PostgreSQL semantic search"
        );
        let sql = format!(
            r#"
            SELECT {}, (1 - (embedding <=> $1::vector))::real AS score
            FROM memories
            WHERE user_id = $2 AND embedding IS NOT NULL
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            "#,
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(format_vector(query_embedding))
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let score: f32 = row.try_get("score")?;
            results.push((score, Self::row_to_entry(row)?));
        }
        info!(limit, count = results.len(), "step: embedding PostgreSQL semantic search done");
        Ok(results)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<usize, anyhow::Error> {
        let result = sqlx::query("DELETE FROM memories WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected() as usize;
        info!(user_id = %user_id, removed, "Deleted user memories from PostgreSQL store");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_vector() {
        assert_eq!(format_vector(&[1.0, 0.5, -2.0]), "[1,0.5,-2]");
        assert_eq!(format_vector(&[]), "[]");
    }

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("[1,0.5,-2]").unwrap(), vec![1.0, 0.5, -2.0]);
        assert_eq!(parse_vector(" [ 0.25 , 3 ] ").unwrap(), vec![0.25, 3.0]);
        assert!(parse_vector("[]").unwrap().is_empty());
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("[1,x]").is_err());
    }
}
