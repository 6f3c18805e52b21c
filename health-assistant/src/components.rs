//! Component factory: builds the agent and its stores from config. Isolates assembly logic from runner.

use std::sync::Arc;

use anthropic_client::mask_token;
use embedding::{EmbeddingService, HashEmbedding, EMBEDDING_PROVIDER_OPENAI};
use health_agent::HealthAgent;
use health_data::MockHealthDataProvider;
use llm_client::{AnthropicLlmClient, LlmClient};
use memory_core::MemoryStore;
use memory_inmemory::InMemoryVectorStore;
use memory_postgres::PgVectorStore;
use openai_embedding::OpenAIEmbedding;
use storage::{InMemoryTurnRepository, PgPoolManager, PgTurnRepository, StorageError, TurnRepository};
use tracing::{error, info, instrument, warn};

use crate::config::{AppConfig, STORAGE_TYPE_POSTGRES};
use crate::core::{AppError, Result};

/// Reply budget of the memory evaluation call.
const EVALUATION_MAX_TOKENS: u32 = 256;

/// Everything the HTTP layer needs; produced by the component factory.
#[derive(Clone)]
pub struct AppComponents {
    pub agent: Arc<HealthAgent>,
    pub memory_store: Arc<dyn MemoryStore>,
    pub turns: Arc<dyn TurnRepository>,
    pub embedding_service: Arc<dyn EmbeddingService>,
}

/// Creates the memory store and turn log. With `postgres` both share one sqlx pool.
#[instrument(skip(config))]
pub async fn create_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn MemoryStore>, Arc<dyn TurnRepository>)> {
    match (config.storage_type(), config.database_url()) {
        (STORAGE_TYPE_POSTGRES, Some(url)) => {
            info!(
                max_connections = config.base.database_max_connections,
                dimension = config.embedding.embedding_dimension,
                "Using PostgreSQL (pgvector) storage"
            );
            let store = PgVectorStore::new(
                url,
                config.base.database_max_connections,
                config.embedding.embedding_dimension,
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to initialize pgvector memory store");
                AppError::Storage(StorageError::Database(e.to_string()))
            })?;
            let pool_manager = PgPoolManager::from_pool(store.pool().clone());
            let turns = PgTurnRepository::with_pool_manager(pool_manager)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to initialize conversation storage");
                    e
                })?;
            Ok((Arc::new(store), Arc::new(turns)))
        }
        (STORAGE_TYPE_POSTGRES, None) => Err(AppError::Config(
            "STORAGE_TYPE=postgres requires DATABASE_URL to be set".to_string(),
        )),
        _ => {
            info!("Using in-memory storage");
            Ok((
                Arc::new(InMemoryVectorStore::new()),
                Arc::new(InMemoryTurnRepository::new()),
            ))
        }
    }
}

/// OpenAI embeddings when configured, otherwise the local hashing embedder.
pub fn create_embedding_service(config: &AppConfig) -> Arc<dyn EmbeddingService> {
    let emb = &config.embedding;
    if emb.embedding_provider == EMBEDDING_PROVIDER_OPENAI {
        info!(
            model = %emb.embedding_model,
            api_key = %mask_token(&emb.openai_api_key),
            "Using OpenAI embeddings"
        );
        Arc::new(OpenAIEmbedding::from_config(emb))
    } else {
        info!(dimension = emb.embedding_dimension, "Using local hash embeddings");
        Arc::new(HashEmbedding::new(emb.embedding_dimension))
    }
}

/// Reply model and a deterministic, smaller-budget evaluator on the same endpoint.
pub fn create_llm_clients(config: &AppConfig) -> Result<(Arc<dyn LlmClient>, Arc<dyn LlmClient>)> {
    if config.llm.has_api_key() {
        info!(
            model = %config.llm.llm_model,
            api_key = %mask_token(&config.llm.anthropic_api_key),
            "Using Anthropic model"
        );
    } else {
        warn!("ANTHROPIC_API_KEY not set, replies will use the fallback message");
    }
    let llm = AnthropicLlmClient::from_config(&config.llm)
        .map_err(|e| AppError::Config(format!("Failed to build LLM client: {}", e)))?;
    let evaluator = AnthropicLlmClient::from_config(&config.llm)
        .map_err(|e| AppError::Config(format!("Failed to build evaluator client: {}", e)))?
        .with_max_tokens(EVALUATION_MAX_TOKENS)
        .with_temperature(0.0);
    Ok((Arc::new(llm), Arc::new(evaluator)))
}

/// Wires the agent around the given clients and stores. Health data is always mock.
pub fn build_agent(
    config: &AppConfig,
    llm: Arc<dyn LlmClient>,
    evaluator: Arc<dyn LlmClient>,
    memory_store: Arc<dyn MemoryStore>,
    turns: Arc<dyn TurnRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
) -> AppComponents {
    let agent = HealthAgent::new(
        llm,
        Arc::clone(&memory_store),
        Arc::clone(&turns),
        Arc::new(MockHealthDataProvider::new()),
        Arc::clone(&embedding_service),
        config.agent.clone(),
    )
    .with_evaluator(evaluator);

    info!(
        memory_store = agent.memory_backend(),
        checkpointer = agent.checkpointer_backend(),
        targeted_limit = config.agent.targeted_limit,
        general_limit = config.agent.general_limit,
        recent_turns = config.agent.recent_turns,
        "Health agent built"
    );

    AppComponents {
        agent: Arc::new(agent),
        memory_store,
        turns,
        embedding_service,
    }
}

/// Builds all components from config.
#[instrument(skip(config))]
pub async fn build_components(config: &AppConfig) -> Result<AppComponents> {
    let (memory_store, turns) = create_stores(config).await?;
    let embedding_service = create_embedding_service(config);
    let (llm, evaluator) = create_llm_clients(config)?;
    Ok(build_agent(
        config,
        llm,
        evaluator,
        memory_store,
        turns,
        embedding_service,
    ))
}
