use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use health_agent::{AgentEvent, ChatInput};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use super::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub initialize: bool,
}

impl ChatRequest {
    /// Rejects blank user ids and messages with 400 before the agent is invoked.
    fn into_input(self) -> Result<ChatInput, ApiError> {
        if self.user_id.trim().is_empty() {
            return Err(ApiError::bad_request("user_id is required"));
        }
        if self.message.trim().is_empty() {
            return Err(ApiError::bad_request("message is required"));
        }
        let mut input = ChatInput::new(self.user_id, self.message).with_initialize(self.initialize);
        if let Some(thread_id) = self.thread_id.filter(|t| !t.trim().is_empty()) {
            input = input.with_thread(thread_id);
        }
        Ok(input)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub thread_id: String,
    pub user_id: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let input = req.into_input()?;
    let output = state.agent.invoke(input).await?;
    info!(
        user_id = %output.user_id,
        thread_id = %output.thread_id,
        latency_ms = output.latency_ms,
        fallback = output.fallback,
        "Chat request served"
    );
    Ok(Json(ChatResponse {
        response: output.reply,
        thread_id: output.thread_id,
        user_id: output.user_id,
    }))
}

pub async fn chat_stream(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let input = req.into_input()?;
    let rx = state.agent.invoke_streaming(input);
    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &AgentEvent) -> Event {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => sse,
        Err(e) => {
            warn!(error = %e, event = event.name(), "Failed to serialize stream event");
            Event::default().event("error").data(e.to_string())
        }
    }
}
