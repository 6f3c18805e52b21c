//! The health agent: one turn runs load_state → retrieve_memories → build_prompt →
//! call_model → evaluate_memory → store_memory → persist_turn.
//!
//! Turns of the same user are serialized by a per-user lock held across all steps; different
//! users run concurrently. Only invalid input fails a turn: model, memory and storage failures
//! are logged and the turn degrades (fallback reply, no memories, unsaved turn).

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use embedding::EmbeddingService;
use health_data::{HealthDataProvider, HealthSnapshot};
use llm_client::LlmClient;
use memory_core::{MemoryEntry, MemoryKind, MemoryMetadata, MemoryStore};
use memory_strategies::{RecentMemoriesStrategy, SemanticSearchStrategy};
use prompt::{
    compose_system_prompt, format_for_model_as_messages, render_system_prompt, ChatMessage,
    FALLBACK_REPLY, SYSTEM_PROMPT, TIME_FORMAT,
};
use serde::{Deserialize, Serialize};
use storage::{ConversationTurn, TurnRepository};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::evaluation::{evaluate_message, heuristic_evaluation, truncate, MemoryEvaluation, Verdict};
use crate::retriever::{MemoryRetriever, RetrievedMemories};

/// Reserved user and thread used by [`HealthAgent::self_check`].
pub const HEALTH_CHECK_ID: &str = "health_check";

const HEALTH_CHECK_MESSAGE: &str = "health check test";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatInput {
    pub user_id: String,
    /// A new UUID v4 thread is started when absent or blank.
    #[serde(default)]
    pub thread_id: Option<String>,
    pub message: String,
    /// Initialize the user with mock health data before the turn.
    #[serde(default)]
    pub initialize: bool,
}

impl ChatInput {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_initialize(mut self, initialize: bool) -> Self {
        self.initialize = initialize;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMemory {
    pub id: Uuid,
    pub content: String,
    pub context: Option<String>,
    pub kind: MemoryKind,
}

impl StoredMemory {
    fn from_entry(entry: &MemoryEntry) -> Self {
        Self {
            id: entry.id,
            content: entry.content.clone(),
            context: entry.context.clone(),
            kind: entry.metadata.kind,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutput {
    pub reply: String,
    pub thread_id: String,
    pub user_id: String,
    pub stored_memory: Option<StoredMemory>,
    pub evaluation: Verdict,
    /// True when the reply is the fallback text.
    pub fallback: bool,
    pub memories_used: usize,
    pub latency_ms: u64,
}

/// Progress of a streamed turn.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    MemoriesRetrieved {
        targeted: usize,
        general: usize,
        memories: Vec<String>,
    },
    Reply {
        text: String,
        fallback: bool,
    },
    MemoryStored {
        evaluation: Verdict,
        memory: StoredMemory,
    },
    Done {
        user_id: String,
        thread_id: String,
        latency_ms: u64,
    },
    Error {
        message: String,
    },
}

impl AgentEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::MemoriesRetrieved { .. } => "memories",
            AgentEvent::Reply { .. } => "reply",
            AgentEvent::MemoryStored { .. } => "memory",
            AgentEvent::Done { .. } => "done",
            AgentEvent::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializedUser {
    pub snapshot: HealthSnapshot,
    pub stored_memories: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDeletion {
    pub deleted_memories: usize,
    pub deleted_turns: u64,
    pub health_data_removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfCheck {
    pub graph_compiled: bool,
    pub model_reachable: bool,
    pub memory_store: &'static str,
    pub checkpointer: &'static str,
    pub test_messages_count: usize,
}

pub struct HealthAgent {
    llm: Arc<dyn LlmClient>,
    evaluator: Arc<dyn LlmClient>,
    memory_store: Arc<dyn MemoryStore>,
    turns: Arc<dyn TurnRepository>,
    health: Arc<dyn HealthDataProvider>,
    embedding: Arc<dyn EmbeddingService>,
    retriever: MemoryRetriever,
    config: AgentConfig,
    system_template: String,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl HealthAgent {
    /// Wires the agent with targeted (semantic) and general (newest) retrieval per `config`.
    /// The same model evaluates memories unless [`with_evaluator`](Self::with_evaluator) is used.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        memory_store: Arc<dyn MemoryStore>,
        turns: Arc<dyn TurnRepository>,
        health: Arc<dyn HealthDataProvider>,
        embedding: Arc<dyn EmbeddingService>,
        config: AgentConfig,
    ) -> Self {
        let retriever = MemoryRetriever::new(Arc::clone(&memory_store))
            .with_strategy(Box::new(SemanticSearchStrategy::new(
                config.targeted_limit,
                Arc::clone(&embedding),
                config.semantic_min_score,
            )))
            .with_strategy(Box::new(RecentMemoriesStrategy::new(config.general_limit)));

        Self {
            evaluator: Arc::clone(&llm),
            llm,
            memory_store,
            turns,
            health,
            embedding,
            retriever,
            config,
            system_template: SYSTEM_PROMPT.to_string(),
            user_locks: DashMap::new(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn LlmClient>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Template with `{user_info}` and `{time}` placeholders.
    pub fn with_system_prompt(mut self, template: impl Into<String>) -> Self {
        self.system_template = template.into();
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn memory_backend(&self) -> &'static str {
        self.memory_store.backend()
    }

    pub fn checkpointer_backend(&self) -> &'static str {
        self.turns.backend()
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Runs one turn.
    pub async fn invoke(&self, input: ChatInput) -> AgentResult<ChatOutput> {
        self.run_turn(input, None).await
    }

    /// Runs one turn in the background and streams its [`AgentEvent`]s. The last event is
    /// `Done`, or `Error` when the input was rejected.
    pub fn invoke_streaming(self: &Arc<Self>, input: ChatInput) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel(16);
        let agent = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = agent.run_turn(input, Some(&tx)).await {
                let _ = tx.send(AgentEvent::Error { message: e.to_string() }).await;
            }
        });
        rx
    }

    #[instrument(skip(self, input, events), fields(user_id = %input.user_id))]
    async fn run_turn(
        &self,
        input: ChatInput,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> AgentResult<ChatOutput> {
        let user_id = input.user_id.trim().to_string();
        let message = input.message.trim().to_string();
        if user_id.is_empty() {
            return Err(AgentError::InvalidInput("user_id must not be empty".to_string()));
        }
        if message.is_empty() {
            return Err(AgentError::InvalidInput("message must not be empty".to_string()));
        }
        let thread_id = input
            .thread_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let started = Instant::now();
        let lock = self.user_lock(&user_id);
        let _guard = lock.lock().await;

        info!(
            user_id = %user_id,
            thread_id = %thread_id,
            message = %truncate(&message, 200),
            "Agent turn started"
        );

        if input.initialize {
            self.initialize_locked(&user_id).await?;
        }

        let history = self.load_state(&user_id, &thread_id).await;

        let retrieved = self.retriever.retrieve(&user_id, &message).await;
        emit(
            events,
            AgentEvent::MemoriesRetrieved {
                targeted: retrieved.targeted,
                general: retrieved.general,
                memories: retrieved.prompt_lines(),
            },
        )
        .await;

        let messages = self
            .build_prompt(&user_id, &history, &retrieved, &message)
            .await;

        let (reply, fallback) = self.call_model(messages).await;
        emit(
            events,
            AgentEvent::Reply {
                text: reply.clone(),
                fallback,
            },
        )
        .await;

        let evaluation = self.evaluate_memory(&history, &message, fallback).await;

        let stored_memory = if evaluation.verdict.should_store() {
            self.store_memory(&user_id, &evaluation).await
        } else {
            None
        };
        if let Some(memory) = &stored_memory {
            emit(
                events,
                AgentEvent::MemoryStored {
                    evaluation: evaluation.verdict,
                    memory: memory.clone(),
                },
            )
            .await;
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        self.persist_turn(&user_id, &thread_id, &message, &reply, latency_ms, fallback)
            .await;

        info!(
            user_id = %user_id,
            thread_id = %thread_id,
            latency_ms,
            fallback,
            evaluation = %evaluation.verdict,
            response = %truncate(&reply, 200),
            "Agent turn finished"
        );
        emit(
            events,
            AgentEvent::Done {
                user_id: user_id.clone(),
                thread_id: thread_id.clone(),
                latency_ms,
            },
        )
        .await;

        Ok(ChatOutput {
            reply,
            thread_id,
            user_id,
            stored_memory,
            evaluation: evaluation.verdict,
            fallback,
            memories_used: retrieved.memories.len(),
            latency_ms,
        })
    }

    /// History is keyed by (user, thread): a thread id reused by another user starts empty.
    async fn load_state(&self, user_id: &str, thread_id: &str) -> Vec<ConversationTurn> {
        match self
            .turns
            .recent_turns(user_id, thread_id, self.config.recent_turns)
            .await
        {
            Ok(turns) => {
                info!(user_id = %user_id, thread_id = %thread_id, count = turns.len(), "step: load_state done");
                turns
            }
            Err(e) => {
                error!(user_id = %user_id, thread_id = %thread_id, error = %e, "step: load_state failed, continuing without history");
                Vec::new()
            }
        }
    }

    async fn build_prompt(
        &self,
        user_id: &str,
        history: &[ConversationTurn],
        retrieved: &RetrievedMemories,
        message: &str,
    ) -> Vec<ChatMessage> {
        let now = chrono::Local::now().format(TIME_FORMAT).to_string();
        let instructions = render_system_prompt(&self.system_template, user_id, &now);

        let health_summary = match self.health.get_or_generate(user_id).await {
            Ok(snapshot) => Some(snapshot.summary()),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Health data unavailable, prompting without it");
                None
            }
        };

        let system = compose_system_prompt(
            &instructions,
            health_summary.as_deref(),
            retrieved.prompt_lines(),
        );
        let messages = format_for_model_as_messages(
            Some(&system),
            history
                .iter()
                .map(|t| (t.user_message.as_str(), t.assistant_reply.as_str())),
            message,
        );

        info!(
            user_id = %user_id,
            system_len = system.len(),
            message_count = messages.len(),
            memory_count = retrieved.memories.len(),
            "step: build_prompt done"
        );
        messages
    }

    async fn call_model(&self, messages: Vec<ChatMessage>) -> (String, bool) {
        let started = Instant::now();
        match self.llm.get_llm_response_with_messages(messages).await {
            Ok(reply) if !reply.trim().is_empty() => {
                info!(
                    model = %self.llm.model_name(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    response_len = reply.len(),
                    "step: call_model done"
                );
                (reply, false)
            }
            Ok(_) => {
                error!(model = %self.llm.model_name(), "step: call_model returned an empty reply, using fallback");
                (FALLBACK_REPLY.to_string(), true)
            }
            Err(e) => {
                error!(model = %self.llm.model_name(), error = %e, "step: call_model failed, using fallback");
                (FALLBACK_REPLY.to_string(), true)
            }
        }
    }

    /// When the reply already fell back the model is not asked again.
    async fn evaluate_memory(
        &self,
        history: &[ConversationTurn],
        message: &str,
        model_failed: bool,
    ) -> MemoryEvaluation {
        let evaluation = if model_failed {
            heuristic_evaluation(message)
        } else {
            let previous = history
                .last()
                .map(|t| (t.user_message.as_str(), t.assistant_reply.as_str()));
            evaluate_message(self.evaluator.as_ref(), previous, message).await
        };
        info!(
            verdict = %evaluation.verdict,
            source = ?evaluation.source,
            "step: evaluate_memory done"
        );
        evaluation
    }

    async fn store_memory(&self, user_id: &str, evaluation: &MemoryEvaluation) -> Option<StoredMemory> {
        let mut entry = MemoryEntry::new(
            evaluation.content.clone(),
            MemoryMetadata::new(user_id, evaluation.verdict.memory_kind()),
        )
        .with_context(evaluation.context.clone());

        match self.embedding.embed(&evaluation.content).await {
            Ok(vector) => entry = entry.with_embedding(vector),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Embedding failed, storing memory without vector");
            }
        }

        let stored = StoredMemory::from_entry(&entry);
        match self.memory_store.add(entry).await {
            Ok(()) => {
                info!(user_id = %user_id, memory_id = %stored.id, kind = ?stored.kind, "step: store_memory done");
                Some(stored)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "step: store_memory failed");
                None
            }
        }
    }

    async fn persist_turn(
        &self,
        user_id: &str,
        thread_id: &str,
        message: &str,
        reply: &str,
        latency_ms: u64,
        fallback: bool,
    ) {
        let turn = ConversationTurn::new(user_id, thread_id, message, reply, latency_ms as i64, fallback);
        if let Err(e) = self.turns.save_turn(&turn).await {
            error!(user_id = %user_id, thread_id = %thread_id, error = %e, "step: persist_turn failed");
        }
    }

    /// Generates fresh mock health data and stores the five health memories.
    pub async fn initialize_user(&self, user_id: &str) -> AgentResult<InitializedUser> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AgentError::InvalidInput("user_id must not be empty".to_string()));
        }
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        self.initialize_locked(user_id).await
    }

    async fn initialize_locked(&self, user_id: &str) -> AgentResult<InitializedUser> {
        let snapshot = self.health.regenerate(user_id).await?;
        let memories = snapshot.initial_memories();
        let texts: Vec<String> = memories.iter().map(|m| m.content.clone()).collect();

        let embeddings: Vec<Option<Vec<f32>>> = match self.embedding.embed_batch(&texts).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors.into_iter().map(Some).collect(),
            Ok(vectors) => {
                warn!(expected = texts.len(), got = vectors.len(), "Embedding batch size mismatch, storing health memories without vectors");
                vec![None; texts.len()]
            }
            Err(e) => {
                warn!(error = %e, "Embedding failed, storing health memories without vectors");
                vec![None; texts.len()]
            }
        };

        let mut stored = 0;
        for (memory, vector) in memories.into_iter().zip(embeddings) {
            let mut entry = MemoryEntry::new(
                memory.content,
                MemoryMetadata::new(user_id, MemoryKind::HealthData),
            )
            .with_context(memory.context);
            if let Some(vector) = vector {
                entry = entry.with_embedding(vector);
            }
            match self.memory_store.add(entry).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    error!(user_id = %user_id, error = %e, "Failed to store health memory, continuing")
                }
            }
        }

        if stored < texts.len() {
            warn!(user_id = %user_id, stored, expected = texts.len(), "User partially initialized");
        } else {
            info!(user_id = %user_id, stored, "User initialized with health data");
        }
        Ok(InitializedUser {
            snapshot,
            stored_memories: stored,
        })
    }

    /// Newest memories of a user.
    pub async fn list_memories(&self, user_id: &str, limit: usize) -> AgentResult<Vec<MemoryEntry>> {
        Ok(self.memory_store.list_by_user(user_id, limit).await?)
    }

    /// Removes the user's memories, turns and cached health data.
    pub async fn delete_user(&self, user_id: &str) -> AgentResult<UserDeletion> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let deleted_memories = self.memory_store.delete_by_user(user_id).await?;
        let deleted_turns = self
            .turns
            .delete_by_user(user_id)
            .await
            .map_err(anyhow::Error::from)?;
        let health_data_removed = self.health.remove(user_id).await?;

        info!(
            user_id = %user_id,
            deleted_memories,
            deleted_turns,
            health_data_removed,
            "User deleted"
        );
        Ok(UserDeletion {
            deleted_memories,
            deleted_turns,
            health_data_removed,
        })
    }

    /// Runs a turn for the reserved `health_check` user and thread, then deletes that user's
    /// turns, memories and health data so repeated checks leave nothing behind.
    pub async fn self_check(&self) -> AgentResult<SelfCheck> {
        let output = self
            .invoke(ChatInput::new(HEALTH_CHECK_ID, HEALTH_CHECK_MESSAGE).with_thread(HEALTH_CHECK_ID))
            .await?;
        let turns = self
            .turns
            .recent_turns(HEALTH_CHECK_ID, HEALTH_CHECK_ID, self.config.recent_turns)
            .await
            .map_err(anyhow::Error::from);
        if let Err(e) = self.delete_user(HEALTH_CHECK_ID).await {
            warn!(error = %e, "Failed to clean up health check data");
        }
        let turns = turns?;
        if output.reply.trim().is_empty() {
            return Err(AgentError::Internal(anyhow::anyhow!(
                "Agent did not produce a reply"
            )));
        }

        Ok(SelfCheck {
            graph_compiled: true,
            model_reachable: !output.fallback,
            memory_store: self.memory_store.backend(),
            checkpointer: self.turns.backend(),
            test_messages_count: turns.len() * 2,
        })
    }
}

async fn emit(events: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            warn!("Event receiver dropped, continuing turn");
        }
    }
}
