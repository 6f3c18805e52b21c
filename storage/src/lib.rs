//! Storage crate: the conversation turn log used as the agent's checkpointer.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – ConversationTurn
//! - [`repository`] – TurnRepository trait
//! - [`inmemory_repo`] – InMemoryTurnRepository
//! - [`turn_repo`] – PgTurnRepository (PostgreSQL)
//! - [`pg_pool`] – PgPoolManager

mod error;
mod inmemory_repo;
mod models;
mod pg_pool;
mod repository;
mod turn_repo;

pub use error::StorageError;
pub use inmemory_repo::InMemoryTurnRepository;
pub use models::ConversationTurn;
pub use pg_pool::PgPoolManager;
pub use repository::TurnRepository;
pub use turn_repo::PgTurnRepository;
