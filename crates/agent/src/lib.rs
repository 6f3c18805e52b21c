//! # Health agent
//!
//! The conversational core of the assistant. Each turn retrieves the user's memories, grounds
//! the prompt in their (mock) health data, asks the model for a reply, decides whether the
//! message holds a durable fact worth remembering and appends the turn to the log.
//!
//! ## External Interactions
//!
//! - **llm-client**: reply generation and memory evaluation
//! - **memory-core / memory-strategies**: memory storage and retrieval
//! - **embedding**: vectors for new memories and semantic search
//! - **storage**: conversation turn log (checkpointer)
//! - **health-data**: per-user health snapshots

mod config;
mod error;
mod evaluation;
mod graph;
mod retriever;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use evaluation::{
    evaluate_message, heuristic_evaluation, parse_evaluation, EvaluationSource, MemoryEvaluation,
    Verdict,
};
pub use graph::{
    AgentEvent, ChatInput, ChatOutput, HealthAgent, InitializedUser, SelfCheck, StoredMemory,
    UserDeletion, HEALTH_CHECK_ID,
};
pub use retriever::{MemoryRetriever, RetrievedMemories};
