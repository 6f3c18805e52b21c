//! # Health assistant application
//!
//! Wires the health agent, memory store, turn log, embeddings and the Anthropic client behind
//! an axum HTTP API. Loads config from env and serves until ctrl-c.

pub mod api;
pub mod cli;
pub mod components;
pub mod config;
pub mod core;
pub mod runner;

pub use api::{build_router, ApiError, AppState};
pub use cli::{load_config, Cli, Commands};
pub use components::{
    build_agent, build_components, create_embedding_service, create_llm_clients, create_stores,
    AppComponents,
};
pub use config::{AppConfig, BaseConfig};
pub use crate::core::{init_tracing, AppError, Result};
pub use runner::run_server;
