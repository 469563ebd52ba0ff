//! Mock classification backend for testing

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Direction;

use super::{AiBackend, ClassifiedBatch, ClassifiedItem, ClassifyRequestItem};

/// In-process mock that classifies by keyword, no network involved
#[derive(Clone, Default)]
pub struct MockBackend;

impl MockBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn classify_chunk(&self, items: &[ClassifyRequestItem]) -> Result<ClassifiedBatch> {
        let items = items
            .iter()
            .map(|item| {
                let text = format!("{} {}", item.title, item.description).to_lowercase();
                let (category, confidence) = if text.contains("netflix") {
                    ("Streaming", 0.95)
                } else if text.contains("uber") || text.contains("posto") {
                    ("Transporte", 0.9)
                } else if text.contains("salario") || text.contains("salário") {
                    ("Entradas", 0.9)
                } else if text.contains("mercado") {
                    ("Mercado", 0.85)
                } else {
                    ("Outros", 0.4)
                };
                let direction = if category == "Entradas" {
                    Some(Direction::Income)
                } else {
                    None
                };
                ClassifiedItem {
                    id: item.id.clone(),
                    category: category.to_string(),
                    direction,
                    confidence: Some(confidence),
                }
            })
            .collect();

        Ok(ClassifiedBatch { items })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn endpoint(&self) -> &str {
        "mock://localhost"
    }
}
