use anyhow::Result;
use tracing::{info, instrument};

use crate::api::{build_router, AppState};
use crate::components::build_components;
use crate::config::AppConfig;
use crate::core::init_tracing;

/// Main entry: validate config, init logging, build components, then serve until ctrl-c.
#[instrument(skip(config))]
pub async fn run_server(config: AppConfig) -> Result<()> {
    config.validate()?;
    if let Some(dir) = std::path::Path::new(config.log_file()).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    init_tracing(config.log_file())?;

    info!(
        storage_type = %config.storage_type(),
        embedding_provider = %config.embedding.embedding_provider,
        model = %config.llm.llm_model,
        "Initializing health assistant"
    );

    let components = build_components(&config).await?;
    let app = build_router(AppState::new(components.agent));

    let addr = config.base().bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Health assistant started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
