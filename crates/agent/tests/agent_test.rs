//! End-to-end turns through [`health_agent::HealthAgent`] with mock models and in-memory stores.

mod common;

use std::sync::Arc;

use common::{harness, FailingLlm, FixedLlm, FlakyMemoryStore, RecordingLlm};
use health_agent::{AgentError, AgentEvent, ChatInput, Verdict};
use health_data::HealthDataProvider;
use memory_core::{MemoryKind, MemoryStore};
use prompt::{MessageRole, CONTINUITY_INSTRUCTION, FALLBACK_REPLY, SECTION_HEALTH, SECTION_MEMORIES};
use storage::TurnRepository;

const SKIP: &str = r#"{"evaluation": "SKIP", "content": "", "context": ""}"#;

/// **Test: The prompt carries last night's sleep for an initialized user.**
///
/// **Setup:** Recording model; user initialized with mock data.
/// **Action:** Ask "How did I sleep last night?".
/// **Expected:** System prompt contains the health section with duration and score; reply returned.
#[tokio::test]
async fn test_sleep_question_is_grounded_in_health_data() {
    let llm = Arc::new(RecordingLlm::new("You slept well.", SKIP));
    let h = harness(llm.clone());

    let init = h.agent.initialize_user("alice").await.unwrap();
    assert_eq!(init.stored_memories, 5);

    let out = h
        .agent
        .invoke(ChatInput::new("alice", "How did I sleep last night?"))
        .await
        .unwrap();
    assert_eq!(out.reply, "You slept well.");
    assert!(!out.fallback);
    assert_eq!(out.evaluation, Verdict::Skip);
    assert!(out.stored_memory.is_none());

    let system = llm.last_system_prompt();
    let sleep = &init.snapshot.sleep;
    assert!(system.contains("User ID: alice"));
    assert!(system.contains(SECTION_HEALTH));
    assert!(system.contains(&format!("{:.1} hours", sleep.duration_hours)));
    assert!(system.contains(&format!("sleep score {}", sleep.sleep_score)));
    assert!(system.contains(SECTION_MEMORIES));
    assert!(system.contains("(Sleep quality and duration data)"));

    let request = llm.chat_requests().pop().unwrap();
    let last = request.last().unwrap();
    assert_eq!(last.role, MessageRole::User);
    assert_eq!(last.content, "How did I sleep last night?");
}

/// **Test: The health section reports the weekly step total, goal and remainder.**
#[tokio::test]
async fn test_weekly_progress_in_prompt() {
    let llm = Arc::new(RecordingLlm::new("Keep going!", SKIP));
    let h = harness(llm.clone());

    h.agent
        .invoke(ChatInput::new("bob", "Am I on track for my weekly step goal?"))
        .await
        .unwrap();

    let snapshot = h.health.get("bob").await.unwrap().expect("generated on first chat");
    let system = llm.last_system_prompt();
    assert!(system.contains(&format!("This week: {} steps", snapshot.weekly_steps())));
    assert!(system.contains(&format!("weekly goal of {}", snapshot.weekly_step_goal())));
    if snapshot.weekly_steps_remaining() > 0 {
        assert!(system.contains(&format!("{} steps to go", snapshot.weekly_steps_remaining())));
    }
}

/// **Test: A STORE verdict from the model adds one inferred memory with an embedding.**
#[tokio::test]
async fn test_model_store_verdict_persists_memory() {
    let llm = Arc::new(RecordingLlm::new(
        "Sorry to hear that. Let's keep workouts low impact.",
        r#"{"evaluation": "STORE", "content": "User has a knee injury", "context": "Mentioned while discussing workouts"}"#,
    ));
    let h = harness(llm.clone());

    let out = h
        .agent
        .invoke(ChatInput::new("carol", "I have a knee injury, what can I do?"))
        .await
        .unwrap();

    assert_eq!(out.evaluation, Verdict::Store);
    let stored = out.stored_memory.expect("memory stored");
    assert_eq!(stored.content, "User has a knee injury");
    assert_eq!(stored.kind, MemoryKind::Inferred);

    let entry = h.memories.get(stored.id).await.unwrap().unwrap();
    assert!(entry.embedding.is_some());
    assert_eq!(entry.context.as_deref(), Some("Mentioned while discussing workouts"));
}

/// **Test: With the model down, the turn returns the fallback and the heuristic still stores the fact.**
#[tokio::test]
async fn test_fallback_reply_and_heuristic_memory() {
    let h = harness(Arc::new(FailingLlm));

    let out = h
        .agent
        .invoke(ChatInput::new("dave", "I have a knee injury"))
        .await
        .unwrap();
    assert!(out.fallback);
    assert_eq!(out.reply, FALLBACK_REPLY);
    assert_eq!(out.evaluation, Verdict::Store);

    let memories = h.agent.list_memories("dave", 100).await.unwrap();
    assert_eq!(memories.len(), 1);
    assert!(memories[0].content.contains("knee injury"));

    let turns = h.turns.turns_by_user("dave").await.unwrap();
    assert_eq!(turns.len(), 1);
    assert!(turns[0].fallback);
}

/// **Test: A second session sees the first session's memory and the continuity instruction.**
#[tokio::test]
async fn test_memory_carries_across_sessions() {
    let llm = Arc::new(RecordingLlm::new(
        "Noted.",
        r#"{"evaluation": "EXPLICIT", "content": "User trains for a half marathon in May", "context": "User asked to remember"}"#,
    ));
    let h = harness(llm.clone());

    h.agent
        .invoke(ChatInput::new("erin", "Remember that I'm training for a half marathon in May").with_thread("s1"))
        .await
        .unwrap();

    h.agent
        .invoke(ChatInput::new("erin", "What should my long run be this week?").with_thread("s2"))
        .await
        .unwrap();

    let system = llm.last_system_prompt();
    assert!(system.contains("- User trains for a half marathon in May (User asked to remember)"));
    assert!(system.contains(CONTINUITY_INSTRUCTION));

    let second = llm.chat_requests().pop().unwrap();
    // New thread: system + the new message only.
    assert_eq!(second.len(), 2);
}

/// **Test: The same thread replays earlier turns as alternating messages.**
#[tokio::test]
async fn test_thread_history_is_replayed() {
    let llm = Arc::new(RecordingLlm::new("ok", SKIP));
    let h = harness(llm.clone());

    let first = h.agent.invoke(ChatInput::new("fay", "Hi")).await.unwrap();
    h.agent
        .invoke(ChatInput::new("fay", "And my heart rate?").with_thread(first.thread_id.clone()))
        .await
        .unwrap();

    let request = llm.chat_requests().pop().unwrap();
    let roles: Vec<MessageRole> = request.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::User]
    );
    assert_eq!(request[1].content, "Hi");
    assert_eq!(request[2].content, "ok");
}

/// **Test: Empty user id or message is rejected before any step runs.**
#[tokio::test]
async fn test_invalid_input_rejected() {
    let llm = Arc::new(RecordingLlm::new("ok", SKIP));
    let h = harness(llm.clone());

    let err = h.agent.invoke(ChatInput::new("  ", "hello")).await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidInput(_)));
    let err = h.agent.invoke(ChatInput::new("u", "")).await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidInput(_)));
    assert!(llm.requests.lock().unwrap().is_empty());
}

/// **Test: Deleting a user removes memories, turns and health data, leaving others.**
#[tokio::test]
async fn test_delete_user() {
    let h = harness(Arc::new(FailingLlm));
    h.agent.initialize_user("gus").await.unwrap();
    h.agent.invoke(ChatInput::new("gus", "I have asthma")).await.unwrap();
    h.agent.initialize_user("hal").await.unwrap();

    let deletion = h.agent.delete_user("gus").await.unwrap();
    assert_eq!(deletion.deleted_memories, 6);
    assert_eq!(deletion.deleted_turns, 1);
    assert!(deletion.health_data_removed);

    assert!(h.agent.list_memories("gus", 100).await.unwrap().is_empty());
    assert_eq!(h.agent.list_memories("hal", 100).await.unwrap().len(), 5);
}

/// **Test: The initialize flag on a turn stores health memories before answering.**
#[tokio::test]
async fn test_initialize_flag() {
    let llm = Arc::new(RecordingLlm::new("Welcome!", SKIP));
    let h = harness(llm.clone());

    h.agent
        .invoke(ChatInput::new("ivy", "Hello").with_initialize(true))
        .await
        .unwrap();

    let memories = h.memories.list_by_user("ivy", 100).await.unwrap();
    assert_eq!(memories.len(), 5);
    assert!(memories.iter().all(|m| m.metadata.kind == MemoryKind::HealthData));
    assert!(llm.last_system_prompt().contains(SECTION_MEMORIES));
}

/// **Test: Streaming emits memories, reply, memory and done in order.**
#[tokio::test]
async fn test_streaming_events() {
    let llm = Arc::new(RecordingLlm::new(
        "Got it.",
        r#"{"evaluation": "STORE", "content": "User prefers morning workouts", "context": "Scheduling"}"#,
    ));
    let h = harness(llm);

    let mut rx = h
        .agent
        .invoke_streaming(ChatInput::new("jay", "I prefer morning workouts"));
    let mut names = Vec::new();
    while let Some(event) = rx.recv().await {
        if let AgentEvent::Reply { text, fallback } = &event {
            assert_eq!(text, "Got it.");
            assert!(!fallback);
        }
        names.push(event.name());
    }
    assert_eq!(names, vec!["memories", "reply", "memory", "done"]);
}

/// **Test: Streaming an invalid request yields a single error event.**
#[tokio::test]
async fn test_streaming_invalid_input() {
    let h = harness(Arc::new(RecordingLlm::new("ok", SKIP)));
    let mut rx = h.agent.invoke_streaming(ChatInput::new("", "hi"));
    let event = rx.recv().await.unwrap();
    assert_eq!(event.name(), "error");
    assert!(rx.recv().await.is_none());
}

/// **Test: Self-check reports backends and the health_check thread's messages.**
#[tokio::test]
async fn test_self_check() {
    let h = harness(Arc::new(RecordingLlm::new("All good.", SKIP)));
    let check = h.agent.self_check().await.unwrap();
    assert!(check.graph_compiled);
    assert!(check.model_reachable);
    assert_eq!(check.memory_store, "memory");
    assert_eq!(check.checkpointer, "memory");
    assert_eq!(check.test_messages_count, 2);

    let down = harness(Arc::new(FailingLlm));
    let check = down.agent.self_check().await.unwrap();
    assert!(!check.model_reachable);
}

/// **Test: Concurrent turns of one user are serialized and all persisted.**
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_same_user() {
    let h = harness(Arc::new(RecordingLlm::new("ok", SKIP)));
    let mut handles = Vec::new();
    for i in 0..8 {
        let agent = h.agent.clone();
        handles.push(tokio::spawn(async move {
            agent
                .invoke(ChatInput::new("kim", format!("message {}", i)).with_thread("shared"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    let turns = h.turns.recent_turns("kim", "shared", 100).await.unwrap();
    assert_eq!(turns.len(), 8);
}

/// **Test: A custom system template replaces the default and still gets user info.**
#[tokio::test]
async fn test_custom_system_prompt() {
    let llm = Arc::new(RecordingLlm::new("ok", SKIP));
    let h = harness(llm.clone());
    let agent = health_agent::HealthAgent::new(
        llm.clone(),
        h.memories.clone(),
        h.turns.clone(),
        h.health.clone(),
        Arc::new(embedding::HashEmbedding::new(128)),
        health_agent::AgentConfig::default(),
    )
    .with_system_prompt("Coach mode.\n{user_info}\nNow: {time}");

    agent.invoke(ChatInput::new("lee", "Plan my week")).await.unwrap();

    let system = llm.last_system_prompt();
    assert!(system.starts_with("Coach mode.\n"));
    assert!(system.contains("User ID: lee"));
    assert!(!system.contains("{time}"));
}

/// **Test: A thread id reused by another user does not bring the first user's history along.**
///
/// **Setup:** alice talks on thread `t-shared`.
/// **Action:** bob sends a message on the same thread id.
/// **Expected:** bob's request is system + his message only; alice's text is nowhere in it.
#[tokio::test]
async fn test_shared_thread_id_does_not_leak_history() {
    let llm = Arc::new(RecordingLlm::new("ok", SKIP));
    let h = harness(llm.clone());

    h.agent
        .invoke(ChatInput::new("alice", "My HIV test came back positive").with_thread("t-shared"))
        .await
        .unwrap();
    h.agent
        .invoke(ChatInput::new("bob", "hello").with_thread("t-shared"))
        .await
        .unwrap();

    let request = llm.chat_requests().pop().unwrap();
    assert_eq!(request.len(), 2);
    assert!(request.iter().all(|m| !m.content.contains("HIV")));

    let alice = h.turns.recent_turns("alice", "t-shared", 10).await.unwrap();
    let bob = h.turns.recent_turns("bob", "t-shared", 10).await.unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(bob.len(), 1);
}

/// **Test: With the model down, a question about remembering is answered but not stored.**
#[tokio::test]
async fn test_fallback_question_is_not_stored() {
    let h = harness(Arc::new(FailingLlm));

    let out = h
        .agent
        .invoke(ChatInput::new("moe", "Can you remember my sleep from Monday?"))
        .await
        .unwrap();
    assert!(out.fallback);
    assert_eq!(out.evaluation, Verdict::Skip);
    assert!(out.stored_memory.is_none());
    assert!(h.agent.list_memories("moe", 100).await.unwrap().is_empty());
}

/// **Test: A working reply model with a broken evaluator falls back to the keyword verdict.**
///
/// **Setup:** Reply from a recording model; evaluator either errors or answers non-JSON.
/// **Action:** A durable fact, then small talk.
/// **Expected:** The fact is stored as inferred, small talk is skipped, replies are not fallbacks.
#[tokio::test]
async fn test_separate_evaluator_failure_uses_heuristic() {
    let evaluators: Vec<Arc<dyn llm_client::LlmClient>> =
        vec![Arc::new(FailingLlm), Arc::new(FixedLlm("I think you should store it, maybe"))];

    for (i, evaluator) in evaluators.into_iter().enumerate() {
        let llm = Arc::new(RecordingLlm::new("Take it easy on that knee.", SKIP));
        let h = harness(llm.clone());
        let agent = health_agent::HealthAgent::new(
            llm.clone(),
            h.memories.clone(),
            h.turns.clone(),
            h.health.clone(),
            Arc::new(embedding::HashEmbedding::new(128)),
            health_agent::AgentConfig::default(),
        )
        .with_evaluator(evaluator);
        let user = format!("nia-{}", i);

        let out = agent
            .invoke(ChatInput::new(user.as_str(), "I have a knee injury"))
            .await
            .unwrap();
        assert!(!out.fallback);
        assert_eq!(out.reply, "Take it easy on that knee.");
        assert_eq!(out.evaluation, Verdict::Store);
        let stored = out.stored_memory.expect("heuristic stores the fact");
        assert_eq!(stored.content, "I have a knee injury");
        assert_eq!(stored.kind, MemoryKind::Inferred);

        let out = agent
            .invoke(ChatInput::new(user.as_str(), "Thanks, see you tomorrow"))
            .await
            .unwrap();
        assert_eq!(out.evaluation, Verdict::Skip);
        assert!(out.stored_memory.is_none());

        // The recording model only ever saw chat requests.
        assert_eq!(llm.requests.lock().unwrap().len(), 2);
        assert_eq!(agent.list_memories(&user, 100).await.unwrap().len(), 1);
    }
}

/// **Test: A store failure mid-initialization reports the partial count instead of failing.**
#[tokio::test]
async fn test_initialize_reports_partial_store() {
    let llm = Arc::new(RecordingLlm::new("ok", SKIP));
    let h = harness(llm.clone());
    let store = Arc::new(FlakyMemoryStore::new(2));
    let agent = health_agent::HealthAgent::new(
        llm,
        store.clone(),
        h.turns.clone(),
        h.health.clone(),
        Arc::new(embedding::HashEmbedding::new(128)),
        health_agent::AgentConfig::default(),
    );

    let init = agent.initialize_user("oli").await.unwrap();
    assert_eq!(init.stored_memories, 2);
    assert_eq!(store.list_by_user("oli", 100).await.unwrap().len(), 2);
}

/// **Test: Repeated self-checks leave no health_check turns or memories behind.**
#[tokio::test]
async fn test_self_check_cleans_up() {
    let llm = Arc::new(RecordingLlm::new(
        "All good.",
        r#"{"evaluation": "STORE", "content": "Health check ran", "context": "Self check"}"#,
    ));
    let h = harness(llm);

    for _ in 0..3 {
        let check = h.agent.self_check().await.unwrap();
        assert_eq!(check.test_messages_count, 2);
    }
    assert!(h
        .turns
        .turns_by_user(health_agent::HEALTH_CHECK_ID)
        .await
        .unwrap()
        .is_empty());
    assert!(h
        .memories
        .list_by_user(health_agent::HEALTH_CHECK_ID, 100)
        .await
        .unwrap()
        .is_empty());
    assert!(h
        .health
        .get(health_agent::HEALTH_CHECK_ID)
        .await
        .unwrap()
        .is_none());
}
