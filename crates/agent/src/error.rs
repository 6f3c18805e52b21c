use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Rejected before any step ran (empty user id or message).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;
