//! Shared fixtures: a recording mock model and an agent wired to in-memory stores.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use embedding::HashEmbedding;
use health_agent::{AgentConfig, HealthAgent};
use health_data::{MockHealthDataGenerator, MockHealthDataProvider};
use llm_client::LlmClient;
use memory_core::{MemoryEntry, MemoryStore};
use memory_inmemory::InMemoryVectorStore;
use prompt::{ChatMessage, MessageRole, MEMORY_EVALUATION_PROMPT};
use storage::InMemoryTurnRepository;
use uuid::Uuid;

/// Records every request; replies with `reply` to chat calls and `evaluation` to memory
/// evaluation calls.
pub struct RecordingLlm {
    pub reply: String,
    pub evaluation: String,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl RecordingLlm {
    pub fn new(reply: &str, evaluation: &str) -> Self {
        Self {
            reply: reply.to_string(),
            evaluation: evaluation.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Chat requests only (evaluation calls filtered out).
    pub fn chat_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|msgs| !is_evaluation(msgs))
            .cloned()
            .collect()
    }

    pub fn last_system_prompt(&self) -> String {
        self.chat_requests()
            .last()
            .and_then(|msgs| msgs.iter().find(|m| m.role == MessageRole::System).cloned())
            .map(|m| m.content)
            .unwrap_or_default()
    }
}

fn is_evaluation(messages: &[ChatMessage]) -> bool {
    messages
        .first()
        .map(|m| m.content == MEMORY_EVALUATION_PROMPT)
        .unwrap_or(false)
}

#[async_trait]
impl LlmClient for RecordingLlm {
    async fn get_llm_response_with_messages(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let evaluation = is_evaluation(&messages);
        self.requests.lock().unwrap().push(messages);
        if evaluation {
            Ok(self.evaluation.clone())
        } else {
            Ok(self.reply.clone())
        }
    }

    fn model_name(&self) -> &str {
        "recording-mock"
    }
}

/// Model that is always down.
pub struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn get_llm_response_with_messages(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        Err(anyhow::anyhow!("connection refused"))
    }

    fn model_name(&self) -> &str {
        "failing-mock"
    }
}

/// Replies to every call with the same text, evaluation calls included.
pub struct FixedLlm(pub &'static str);

#[async_trait]
impl LlmClient for FixedLlm {
    async fn get_llm_response_with_messages(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn model_name(&self) -> &str {
        "fixed-mock"
    }
}

/// In-memory store whose `add` fails once `fail_after` entries were accepted.
pub struct FlakyMemoryStore {
    pub inner: InMemoryVectorStore,
    pub fail_after: usize,
    pub added: AtomicUsize,
}

impl FlakyMemoryStore {
    pub fn new(fail_after: usize) -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            fail_after,
            added: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MemoryStore for FlakyMemoryStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn add(&self, entry: MemoryEntry) -> Result<()> {
        if self.added.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            anyhow::bail!("disk full");
        }
        self.inner.add(entry).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<MemoryEntry>> {
        self.inner.get(id).await
    }

    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        self.inner.list_by_user(user_id, limit).await
    }

    async fn semantic_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        user_id: &str,
    ) -> Result<Vec<(f32, MemoryEntry)>> {
        self.inner.semantic_search(query_embedding, limit, user_id).await
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<usize> {
        self.inner.delete_by_user(user_id).await
    }
}

pub struct Harness {
    pub agent: Arc<HealthAgent>,
    pub memories: Arc<InMemoryVectorStore>,
    pub turns: Arc<InMemoryTurnRepository>,
    pub health: Arc<MockHealthDataProvider>,
}

pub fn harness(llm: Arc<dyn LlmClient>) -> Harness {
    let memories = Arc::new(InMemoryVectorStore::new());
    let turns = Arc::new(InMemoryTurnRepository::new());
    let health = Arc::new(MockHealthDataProvider::with_generator(
        MockHealthDataGenerator::with_seed(11),
    ));
    let agent = HealthAgent::new(
        llm,
        memories.clone(),
        turns.clone(),
        health.clone(),
        Arc::new(HashEmbedding::new(128)),
        AgentConfig::default(),
    );
    Harness {
        agent: Arc::new(agent),
        memories,
        turns,
        health,
    }
}
