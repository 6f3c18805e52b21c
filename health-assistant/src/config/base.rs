//! Base config: bind address, logging, storage. Loaded from env.

use anyhow::Result;
use std::env;

pub const STORAGE_TYPE_MEMORY: &str = "memory";
pub const STORAGE_TYPE_POSTGRES: &str = "postgres";

#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// HOST
    pub host: String,
    /// PORT
    pub port: u16,
    /// Log file path
    pub log_file: String,
    /// PostgreSQL URL for memories and turns
    pub database_url: Option<String>,
    /// "memory" or "postgres"
    pub storage_type: String,
    pub database_max_connections: u32,
}

impl BaseConfig {
    /// Load from environment variables. `host` and `port` override HOST and PORT if provided.
    pub fn load(host: Option<String>, port: Option<u16>) -> Result<Self> {
        let host = host
            .or_else(|| env::var("HOST").ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match port {
            Some(port) => port,
            None => match env::var("PORT") {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT is not a valid port number: {}", raw))?,
                Err(_) => 8000,
            },
        };
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/health-assistant.log".to_string());
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let storage_type = env::var("STORAGE_TYPE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| {
                if database_url.is_some() {
                    STORAGE_TYPE_POSTGRES.to_string()
                } else {
                    STORAGE_TYPE_MEMORY.to_string()
                }
            });
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            host,
            port,
            log_file,
            database_url,
            storage_type,
            database_max_connections,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }
        match self.storage_type.as_str() {
            STORAGE_TYPE_MEMORY => {}
            STORAGE_TYPE_POSTGRES => {
                if self.database_url.is_none() {
                    anyhow::bail!("STORAGE_TYPE=postgres requires DATABASE_URL to be set");
                }
            }
            other => anyhow::bail!(
                "Unknown STORAGE_TYPE '{}', expected 'memory' or 'postgres'",
                other
            ),
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be greater than 0");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
