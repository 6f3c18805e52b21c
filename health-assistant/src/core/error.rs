//! Error types for the application layer.

use health_agent::AgentError;
use storage::StorageError;
use thiserror::Error;

/// Top-level error for startup and wiring (config, storage, agent, IO).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for application operations; uses [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
