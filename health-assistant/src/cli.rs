//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "fitbit-assistant")]
#[command(about = "Fitbit conversational health assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (config from env; flags override HOST and PORT).
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Load AppConfig from environment with optional bind overrides.
pub fn load_config(host: Option<String>, port: Option<u16>) -> Result<AppConfig> {
    AppConfig::load(host, port)
}
