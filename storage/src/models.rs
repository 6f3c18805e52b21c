//! Conversation turn model.
//!
//! Maps to the `conversation_turns` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub user_id: String,
    pub thread_id: String,
    pub user_message: String,
    pub assistant_reply: String,
    pub created_at: DateTime<Utc>,
    pub latency_ms: i64,
    /// True when the reply is the fallback text.
    pub fallback: bool,
}

impl ConversationTurn {
    /// Creates a new turn with a generated id and the current timestamp.
    pub fn new(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        user_message: impl Into<String>,
        assistant_reply: impl Into<String>,
        latency_ms: i64,
        fallback: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            user_message: user_message.into(),
            assistant_reply: assistant_reply.into(),
            created_at: Utc::now(),
            latency_ms,
            fallback,
        }
    }
}
