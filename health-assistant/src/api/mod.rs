//! HTTP API over the health agent.

mod chat;
mod error;
mod health;
mod users;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use health_agent::HealthAgent;
use tower_http::cors::{Any, CorsLayer};

pub use error::ApiError;

/// Listing limit of `GET /users/{id}/memories`.
pub const MEMORY_LIST_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<HealthAgent>,
}

impl AppState {
    pub fn new(agent: Arc<HealthAgent>) -> Self {
        Self { agent }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health::root))
        .route("/favicon.ico", get(health::favicon))
        .route("/health", get(health::health))
        .route("/health/agent", get(health::health_agent))
        .route("/chat", post(chat::chat))
        .route("/chat/stream", post(chat::chat_stream))
        .route("/initialize-user", post(users::initialize_user))
        .route("/users/{user_id}/memories", get(users::get_memories))
        .route("/users/{user_id}", delete(users::delete_user))
        .layer(cors)
        .with_state(state)
}
