//! Agent tuning knobs.

/// Retrieval and history sizes for one turn.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Turns of the thread loaded as conversation history.
    pub recent_turns: usize,
    /// Semantic search results on the message.
    pub targeted_limit: usize,
    /// Newest memories added regardless of the message.
    pub general_limit: usize,
    pub semantic_min_score: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            recent_turns: 10,
            targeted_limit: 3,
            general_limit: 5,
            semantic_min_score: 0.0,
        }
    }
}
