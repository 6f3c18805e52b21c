//! Binary for the Fitbit conversational health assistant.

use anyhow::Result;
use clap::Parser;
use health_assistant::{load_config, run_server, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let config = load_config(host, port)?;
            run_server(config).await
        }
    }
}
