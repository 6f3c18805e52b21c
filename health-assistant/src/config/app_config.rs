//! AppConfig: BaseConfig + LLM, embedding and agent settings. Use load() for env-based loading.
//!
//! LLM and embedding configs live in their own crates; this type only groups them.

use anyhow::Result;
use embedding::EnvEmbeddingConfig;
use health_agent::AgentConfig;
use llm_client::EnvLlmConfig;
use std::env;

use super::BaseConfig;

pub struct AppConfig {
    pub base: BaseConfig,
    pub llm: EnvLlmConfig,
    pub embedding: EnvEmbeddingConfig,
    pub agent: AgentConfig,
}

impl AppConfig {
    /// Load full config from environment variables. `host` and `port` come from CLI flags.
    /// Call validate() after load to check config before init.
    pub fn load(host: Option<String>, port: Option<u16>) -> Result<Self> {
        Ok(Self {
            base: BaseConfig::load(host, port)?,
            llm: EnvLlmConfig::from_env()?,
            embedding: EnvEmbeddingConfig::from_env()?,
            agent: agent_config_from_env(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.llm.validate()?;
        self.embedding.validate()?;
        if self.agent.recent_turns == 0 {
            anyhow::bail!("AGENT_RECENT_TURNS must be greater than 0");
        }
        Ok(())
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn storage_type(&self) -> &str {
        &self.base.storage_type
    }
    pub fn database_url(&self) -> Option<&str> {
        self.base.database_url.as_deref()
    }
}

fn agent_config_from_env() -> AgentConfig {
    let defaults = AgentConfig::default();
    AgentConfig {
        recent_turns: env_parse("AGENT_RECENT_TURNS").unwrap_or(defaults.recent_turns),
        targeted_limit: env_parse("MEMORY_TARGETED_LIMIT").unwrap_or(defaults.targeted_limit),
        general_limit: env_parse("MEMORY_GENERAL_LIMIT").unwrap_or(defaults.general_limit),
        semantic_min_score: env_parse("MEMORY_SEMANTIC_MIN_SCORE")
            .unwrap_or(defaults.semantic_min_score),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
