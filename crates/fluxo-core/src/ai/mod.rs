//! AI fallback classification
//!
//! Drafts the local rules cannot categorize are batched and delegated to an
//! external text-classification service. The contract with callers is strict:
//! `classify_batch` returns exactly one result per input, in input order,
//! whatever the service does. Parse failures, schema violations, timeouts
//! and omitted items all degrade to the reserved fallback category.
//!
//! # Configuration
//!
//! Configuration is an explicit [`AiConfig`] value passed at construction.
//! `AiConfig::from_env` reads:
//! - `FLUXO_AI_ENDPOINT`: base URL of an OpenAI-compatible service (required)
//! - `FLUXO_AI_MODEL`: model name (default: llama-3.1-8b-instant)

mod mock;
mod openai_compatible;
pub mod parsing;

pub use mock::MockBackend;
pub use openai_compatible::OpenAiCompatibleBackend;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::models::{Category, Direction};

/// Default number of drafts per classification request
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Confidence attached to synthesized fallback classifications
pub const FALLBACK_CONFIDENCE: f64 = 0.2;

/// Explicit configuration for the AI fallback classifier
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Base URL of the OpenAI-compatible service
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Drafts per request, bounded by the service's payload limits
    pub chunk_size: usize,
    /// Per-chunk timeout; a timed-out chunk falls back like a schema failure
    pub request_timeout: Duration,
}

impl AiConfig {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create from environment variables; None when the endpoint is unset
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("FLUXO_AI_ENDPOINT").ok()?;
        let model = std::env::var("FLUXO_AI_MODEL")
            .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());
        Some(Self::new(&endpoint, &model))
    }
}

/// One draft as sent to the classification service
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequestItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Signed: positive income, negative expense
    pub amount: f64,
    /// ISO-8601 source date
    pub date: String,
}

/// One per-item result as the service answers it (unknown fields rejected)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifiedItem {
    pub id: String,
    pub category: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Validated batch response shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifiedBatch {
    pub items: Vec<ClassifiedItem>,
}

/// A sanitized classification, clamped to the closed vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub id: String,
    pub category: Category,
    /// Service override when present and valid, else sign-derived
    pub direction: Direction,
    pub confidence: Option<f64>,
}

/// Trait defining the interface for classification backends
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Classify one chunk; returns the validated raw batch
    async fn classify_chunk(&self, items: &[ClassifyRequestItem]) -> Result<ClassifiedBatch>;

    /// Whether the service answers at all
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Service URL (for logging)
    fn endpoint(&self) -> &str;
}

/// Concrete classification client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AiClient {
    /// Any service exposing the OpenAI chat-completions API
    OpenAiCompatible(OpenAiCompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AiClient {
    /// Create from environment variables; None when not configured
    pub fn from_env() -> Option<Self> {
        AiConfig::from_env().map(Self::openai_compatible)
    }

    pub fn openai_compatible(config: AiConfig) -> Self {
        AiClient::OpenAiCompatible(OpenAiCompatibleBackend::new(config))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AiClient::Mock(MockBackend::new())
    }

    pub fn chunk_size(&self) -> usize {
        match self {
            AiClient::OpenAiCompatible(b) => b.config().chunk_size,
            AiClient::Mock(_) => DEFAULT_CHUNK_SIZE,
        }
    }
}

#[async_trait]
impl AiBackend for AiClient {
    async fn classify_chunk(&self, items: &[ClassifyRequestItem]) -> Result<ClassifiedBatch> {
        match self {
            AiClient::OpenAiCompatible(b) => b.classify_chunk(items).await,
            AiClient::Mock(b) => b.classify_chunk(items).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AiClient::OpenAiCompatible(b) => b.health_check().await,
            AiClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AiClient::OpenAiCompatible(b) => b.model(),
            AiClient::Mock(b) => b.model(),
        }
    }

    fn endpoint(&self) -> &str {
        match self {
            AiClient::OpenAiCompatible(b) => b.endpoint(),
            AiClient::Mock(b) => b.endpoint(),
        }
    }
}

/// Classify every item, never dropping one.
///
/// Chunks the input, calls the service per chunk, and repairs the result set
/// so it covers the request 1:1: chunk-level failures substitute the reserved
/// fallback for every item in the chunk, and items the response omits get
/// the same fallback individually.
pub async fn classify_batch(
    client: &AiClient,
    items: &[ClassifyRequestItem],
) -> Vec<Classification> {
    let mut results = Vec::with_capacity(items.len());
    if items.is_empty() {
        return results;
    }

    let chunk_size = client.chunk_size().max(1);
    for chunk in items.chunks(chunk_size) {
        match client.classify_chunk(chunk).await {
            Ok(batch) => results.extend(merge_chunk(chunk, batch.items)),
            Err(e) => {
                warn!(
                    "AI classification failed for chunk of {}: {} (falling back to {})",
                    chunk.len(),
                    e,
                    Category::Outros.as_str()
                );
                results.extend(chunk.iter().map(fallback_classification));
            }
        }
    }

    results
}

/// Resolve a chunk response against its request, in request order
fn merge_chunk(inputs: &[ClassifyRequestItem], items: Vec<ClassifiedItem>) -> Vec<Classification> {
    let mut by_id: HashMap<String, ClassifiedItem> =
        items.into_iter().map(|item| (item.id.clone(), item)).collect();

    inputs
        .iter()
        .map(|input| match by_id.remove(&input.id) {
            Some(item) => resolve_item(input, item),
            None => {
                warn!("AI response omitted item {}, synthesizing fallback", input.id);
                fallback_classification(input)
            }
        })
        .collect()
}

/// Clamp a raw service result to the closed contract
fn resolve_item(input: &ClassifyRequestItem, item: ClassifiedItem) -> Classification {
    Classification {
        id: input.id.clone(),
        category: Category::clamped(&item.category),
        direction: item
            .direction
            .unwrap_or_else(|| Direction::from_signed(input.amount)),
        confidence: item.confidence.map(|c| c.clamp(0.0, 1.0)),
    }
}

/// Deterministic reserved-category fallback for one item
pub fn fallback_classification(input: &ClassifyRequestItem) -> Classification {
    Classification {
        id: input.id.clone(),
        category: Category::Outros,
        direction: Direction::from_signed(input.amount),
        confidence: Some(FALLBACK_CONFIDENCE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, amount: f64) -> ClassifyRequestItem {
        ClassifyRequestItem {
            id: id.to_string(),
            title: "Teste".to_string(),
            description: "compra teste".to_string(),
            amount,
            date: "2025-03-05T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_resolve_item_clamps_category_and_confidence() {
        let resolved = resolve_item(
            &item("a", -10.0),
            ClassifiedItem {
                id: "a".into(),
                category: "Criptomoedas".into(),
                direction: None,
                confidence: Some(1.5),
            },
        );
        assert_eq!(resolved.category, Category::Outros);
        assert_eq!(resolved.confidence, Some(1.0));
        assert_eq!(resolved.direction, Direction::Expense);

        let resolved = resolve_item(
            &item("b", 10.0),
            ClassifiedItem {
                id: "b".into(),
                category: "Mercado".into(),
                direction: None,
                confidence: Some(-0.3),
            },
        );
        assert_eq!(resolved.category, Category::Mercado);
        assert_eq!(resolved.confidence, Some(0.0));
    }

    #[test]
    fn test_resolve_item_accepts_direction_override() {
        let resolved = resolve_item(
            &item("a", -10.0),
            ClassifiedItem {
                id: "a".into(),
                category: "Entradas".into(),
                direction: Some(Direction::Income),
                confidence: None,
            },
        );
        assert_eq!(resolved.direction, Direction::Income);
        assert_eq!(resolved.confidence, None);
    }

    #[test]
    fn test_merge_chunk_covers_omitted_items() {
        let inputs = vec![item("a", -5.0), item("b", 7.0), item("c", -9.0)];
        let response = vec![ClassifiedItem {
            id: "b".into(),
            category: "Entradas".into(),
            direction: None,
            confidence: Some(0.9),
        }];

        let merged = merge_chunk(&inputs, response);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].category, Category::Outros);
        assert_eq!(merged[0].confidence, Some(FALLBACK_CONFIDENCE));
        assert_eq!(merged[1].category, Category::Entradas);
        assert_eq!(merged[2].direction, Direction::Expense);
    }

    #[tokio::test]
    async fn test_classify_batch_is_one_to_one_with_mock() {
        let client = AiClient::mock();
        let inputs: Vec<ClassifyRequestItem> =
            (0..7).map(|i| item(&format!("id-{}", i), -1.0)).collect();

        let results = classify_batch(&client, &inputs).await;
        assert_eq!(results.len(), inputs.len());
        for (input, result) in inputs.iter().zip(&results) {
            assert_eq!(input.id, result.id);
            assert!(Category::ALL.contains(&result.category));
            if let Some(c) = result.confidence {
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }

    #[tokio::test]
    async fn test_classify_batch_empty_input() {
        let client = AiClient::mock();
        assert!(classify_batch(&client, &[]).await.is_empty());
    }
}
