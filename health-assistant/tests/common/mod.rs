//! Router fixtures: mock models and an app over in-memory stores.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use embedding::HashEmbedding;
use health_agent::{AgentConfig, HealthAgent};
use health_assistant::{build_router, AppState};
use health_data::MockHealthDataProvider;
use llm_client::LlmClient;
use memory_inmemory::InMemoryVectorStore;
use prompt::{ChatMessage, MEMORY_EVALUATION_PROMPT};
use serde_json::Value;
use storage::InMemoryTurnRepository;
use tower::ServiceExt;

/// Answers chat calls with `reply` and evaluation calls with `evaluation`.
pub struct ScriptedLlm {
    pub reply: String,
    pub evaluation: String,
}

impl ScriptedLlm {
    pub fn new(reply: &str, evaluation: &str) -> Self {
        Self {
            reply: reply.to_string(),
            evaluation: evaluation.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn get_llm_response_with_messages(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let is_evaluation = messages
            .first()
            .map(|m| m.content == MEMORY_EVALUATION_PROMPT)
            .unwrap_or(false);
        if is_evaluation {
            Ok(self.evaluation.clone())
        } else {
            Ok(self.reply.clone())
        }
    }

    fn model_name(&self) -> &str {
        "scripted-mock"
    }
}

pub struct DownLlm;

#[async_trait]
impl LlmClient for DownLlm {
    async fn get_llm_response_with_messages(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        Err(anyhow::anyhow!("ANTHROPIC_API_KEY not set"))
    }

    fn model_name(&self) -> &str {
        "down-mock"
    }
}

pub const SKIP: &str = r#"{"evaluation": "SKIP", "content": "", "context": ""}"#;

pub fn app(llm: Arc<dyn LlmClient>) -> Router {
    let agent = HealthAgent::new(
        llm,
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(InMemoryTurnRepository::new()),
        Arc::new(MockHealthDataProvider::new()),
        Arc::new(HashEmbedding::new(64)),
        AgentConfig::default(),
    );
    build_router(AppState::new(Arc::new(agent)))
}

/// Sends one request; returns status and the raw body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
