//! Core types for memory storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a memory came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemoryKind {
    /// Written when the user is initialized with mock health data.
    HealthData,
    /// A durable fact the agent picked up from the conversation.
    Inferred,
    /// The user explicitly asked the assistant to remember something.
    Explicit,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::HealthData => "HealthData",
            MemoryKind::Inferred => "Inferred",
            MemoryKind::Explicit => "Explicit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HealthData" => Some(MemoryKind::HealthData),
            "Inferred" => Some(MemoryKind::Inferred),
            "Explicit" => Some(MemoryKind::Explicit),
            _ => None,
        }
    }
}

/// Metadata associated with a memory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryMetadata {
    pub user_id: String,
    pub kind: MemoryKind,
    pub created_at: DateTime<Utc>,
}

impl MemoryMetadata {
    pub fn new(user_id: impl Into<String>, kind: MemoryKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

/// A short natural-language fact about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub content: String,
    /// Where the fact came from, e.g. "Sleep quality and duration data".
    pub context: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub metadata: MemoryMetadata,
}

impl MemoryEntry {
    pub fn new(content: String, metadata: MemoryMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            context: None,
            embedding: None,
            metadata,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Prompt line for this memory: `- {content} ({context})`.
    pub fn to_prompt_line(&self) -> String {
        match self.context.as_deref() {
            Some(ctx) => format!("- {} ({})", self.content, ctx),
            None => format!("- {}", self.content),
        }
    }
}

/// A memory together with its similarity score, if it came from a semantic search.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub score: Option<f32>,
    pub entry: MemoryEntry,
}

impl ScoredMemory {
    pub fn scored(score: f32, entry: MemoryEntry) -> Self {
        Self {
            score: Some(score),
            entry,
        }
    }

    pub fn unscored(entry: MemoryEntry) -> Self {
        Self { score: None, entry }
    }
}

/// Cosine similarity; 0 for empty, mismatched or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}
