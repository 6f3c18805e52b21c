//! # OpenAI Embedding Service
//!
//! [`EmbeddingService`] backed by the OpenAI embeddings API (default model
//! `text-embedding-3-small`). Memories and chat messages are embedded with the same model so
//! their vectors are comparable.
//!
//! ## Configuration
//!
//! - **API Key**: `OPENAI_API_KEY`
//! - **Base URL** (optional): `OPENAI_BASE_URL` for OpenAI-compatible endpoints
//! - **Dimensions** (optional): text-embedding-3 models can shorten vectors to match the
//!   pgvector column (`EMBEDDING_DIMENSION`)
//!
//! # External Interactions
//!
//! - **OpenAI API**: HTTPS POST to `{base}/embeddings`, subject to rate limits and billing.

use std::time::Duration;

use async_openai::{types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingService};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const EMBED_TIMEOUT: Duration = Duration::from_secs(30);
const EMBED_BATCH_TIMEOUT: Duration = Duration::from_secs(60);
const LOG_PREVIEW_LEN: usize = 50;

/// OpenAI embedding service. Holds the async-openai client, model and optional output size.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
}

impl OpenAIEmbedding {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_base_url(api_key, model, None)
    }

    /// When `base_url` is `Some`, requests go to that URL instead of the default OpenAI API.
    pub fn new_with_base_url(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        Self {
            client: Client::with_config(openai_config),
            model,
            dimensions: None,
        }
    }

    /// Builds the service from embedding config, requesting vectors of `config.dimension()`.
    pub fn from_config(config: &dyn EmbeddingConfig) -> Self {
        Self::new_with_base_url(
            config.openai_api_key().to_string(),
            config.model().to_string(),
            config.openai_base_url(),
        )
        .with_dimensions(config.dimension() as u32)
    }

    pub fn with_api_key(api_key: String) -> Self {
        Self::new(api_key, DEFAULT_EMBEDDING_MODEL.to_string())
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Requests shortened vectors. Only text-embedding-3 models accept this.
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> Option<u32> {
        self.dimensions
    }

    fn preview(text: &str) -> String {
        match text.char_indices().nth(LOG_PREVIEW_LEN) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }

    async fn request(
        &self,
        inputs: Vec<String>,
        timeout: Duration,
    ) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(self.model.clone()).input(inputs);
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args.build()?;

        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(timeout, embeddings.create(request)).await {
            Ok(Ok(r)) => {
                debug!("OpenAI embeddings response received");
                r
            }
            Ok(Err(e)) => {
                warn!(error = %e, "OpenAI embeddings request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "OpenAI embeddings request timed out");
                return Err(anyhow::anyhow!(
                    "OpenAI embeddings request timed out after {} seconds",
                    timeout.as_secs()
                ));
            }
        };
        Ok(response.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        info!(
            model = %self.model,
            text_preview = %Self::preview(text),
            "step: embedding OpenAI embed request"
        );
        let embedding = self
            .request(vec![text.to_string()], EMBED_TIMEOUT)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding in response"))?;
        info!(dimension = embedding.len(), "step: embedding OpenAI embed done");
        Ok(embedding)
    }

    #[instrument(skip(self, texts), fields(model = %self.model, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            debug!("OpenAI embed_batch empty input, skipping");
            return Ok(vec![]);
        }
        let embeddings = self.request(texts.to_vec(), EMBED_BATCH_TIMEOUT).await?;
        if embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            ));
        }
        info!(count = embeddings.len(), "step: embedding OpenAI embed_batch done");
        Ok(embeddings)
    }
}
