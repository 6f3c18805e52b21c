//! Integration tests for the OpenAI embedding service.
//!
//! Tests that call the API are `#[ignore]` and need `OPENAI_API_KEY` (root `.env` works).
//! Quota/billing errors are treated as a skip, not a failure.

use std::path::Path;

use embedding::{EmbeddingService, EnvEmbeddingConfig};
use openai_embedding::OpenAIEmbedding;

/// Path: `crates/embedding/openai-embedding` → `../../../.env` = repo root.
fn load_root_env() {
    let root_env = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../.env");
    let _ = dotenvy::from_path(root_env);
}

fn is_quota_or_billing_error(e: &anyhow::Error) -> bool {
    let s = e.to_string();
    s.contains("insufficient_quota") || s.contains("billing") || s.contains("rate_limit")
}

/// **Test: Health fact embedding at the configured dimension (real API).**
///
/// **Expected:** One vector of exactly 256 floats, since the service requests shortened output.
#[tokio::test]
#[ignore]
async fn test_openai_embedding_with_dimensions() {
    load_root_env();
    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set for this test (or set in root .env)");
    let service = OpenAIEmbedding::with_api_key(api_key).with_dimensions(256);

    match service.embed("User has a knee injury").await {
        Ok(embedding) => assert_eq!(embedding.len(), 256),
        Err(e) if is_quota_or_billing_error(&e) => {
            eprintln!("skipped: OpenAI quota/billing limit ({})", e);
        }
        Err(e) => panic!("OpenAI embed request failed: {}", e),
    }
}

/// **Test: Batch embedding keeps input order and count (real API).**
#[tokio::test]
#[ignore]
async fn test_openai_embedding_batch() {
    load_root_env();
    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set for this test (or set in root .env)");
    let service = OpenAIEmbedding::with_api_key(api_key);
    let texts = vec![
        "Slept 7.2 hours".to_string(),
        "Walked 8000 steps".to_string(),
    ];

    match service.embed_batch(&texts).await {
        Ok(embeddings) => {
            assert_eq!(embeddings.len(), 2);
            assert!(embeddings.iter().all(|e| e.len() == 1536));
        }
        Err(e) if is_quota_or_billing_error(&e) => {
            eprintln!("skipped: OpenAI quota/billing limit ({})", e);
        }
        Err(e) => panic!("OpenAI embed_batch request failed: {}", e),
    }
}

/// **Test: Empty batch short-circuits without any request.**
#[tokio::test]
async fn test_empty_batch_returns_empty() {
    let service = OpenAIEmbedding::with_api_key(String::new());
    assert!(service.embed_batch(&[]).await.unwrap().is_empty());
}

/// **Test: Construction from config carries model and dimension.**
#[test]
fn test_from_config() {
    let config = EnvEmbeddingConfig {
        embedding_provider: "openai".to_string(),
        openai_api_key: "sk-test".to_string(),
        openai_base_url: None,
        embedding_model: "text-embedding-3-large".to_string(),
        embedding_dimension: 512,
    };
    let service = OpenAIEmbedding::from_config(&config);
    assert_eq!(service.model(), "text-embedding-3-large");
    assert_eq!(service.dimensions(), Some(512));
}
