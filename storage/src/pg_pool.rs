//! PostgreSQL connection pool wrapper for the storage crate.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Owns one PostgreSQL pool; cloning shares it.
#[derive(Clone)]
pub struct PgPoolManager {
    pool: PgPool,
}

impl PgPoolManager {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        info!(max_connections, "Initializing PostgreSQL pool");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
