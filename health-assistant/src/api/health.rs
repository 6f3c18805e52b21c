use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{error, warn};

use super::AppState;

const SERVICE_NAME: &str = "Fitbit Conversational AI";
const AGENT_NAME: &str = "Fitbit AI Health Assistant";

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "description": "Conversational health assistant grounded in (mock) Fitbit data with long-term memory",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "initialize_user": "/initialize-user",
            "chat": "/chat",
            "chat_stream": "/chat/stream",
            "memories": "/users/{user_id}/memories",
        },
        "status": "healthy",
    }))
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

/// Runs a full turn for the reserved health_check user. The status code is 200 either way;
/// the body says unhealthy when the turn fails or the model could not be reached.
pub async fn health_agent(State(state): State<AppState>) -> Json<Value> {
    match state.agent.self_check().await {
        Ok(check) if check.model_reachable => Json(json!({
            "status": "healthy",
            "agent": AGENT_NAME,
            "graph_compiled": check.graph_compiled,
            "memory_store": check.memory_store,
            "checkpointer": check.checkpointer,
            "test_messages_count": check.test_messages_count,
        })),
        Ok(_) => {
            warn!("Agent health check fell back, model unreachable");
            Json(json!({
                "status": "unhealthy",
                "error": "Language model unreachable",
                "agent": AGENT_NAME,
            }))
        }
        Err(e) => {
            error!(error = %e, "Agent health check failed");
            Json(json!({
                "status": "unhealthy",
                "error": e.to_string(),
                "agent": AGENT_NAME,
            }))
        }
    }
}
