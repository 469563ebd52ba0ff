//! The ingestion pipeline: statement bytes in, categorized records out
//!
//! Per-row steps run in sequence for each draft (parse → normalize →
//! identify → local-classify), then the AI fallback runs batched over the
//! rows the rules skipped, then the reconciler default-fills and bulk-upserts
//! the whole set. One import call is one synchronous request-response cycle;
//! the only suspension points are the AI chunk calls and the store write.

use std::io::Read;

use tracing::{debug, info};

use crate::ai::{self, AiClient, ClassifyRequestItem};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::import::{parse_statement, ParsedStatement};
use crate::models::{Category, ImportSummary};
use crate::normalize::TextNormalizer;
use crate::rules::RuleSet;

pub struct ImportPipeline {
    db: Database,
    normalizer: TextNormalizer,
    rules: RuleSet,
    ai: Option<AiClient>,
}

impl ImportPipeline {
    pub fn new(db: Database, ai: Option<AiClient>) -> Result<Self> {
        Self::with_rules(db, RuleSet::new()?, ai)
    }

    /// Build with a custom rule set (e.g. a non-default transfer policy)
    pub fn with_rules(db: Database, rules: RuleSet, ai: Option<AiClient>) -> Result<Self> {
        Ok(Self {
            db,
            normalizer: TextNormalizer::new()?,
            rules,
            ai,
        })
    }

    /// Run one import call end to end
    pub async fn run<R: Read>(&self, reader: R) -> Result<ImportSummary> {
        let ParsedStatement {
            mut drafts,
            total_rows,
            skipped_rows,
        } = parse_statement(reader, &self.normalizer)?;

        // the one batch-level fatal condition, raised before any store write
        if total_rows == 0 {
            return Err(Error::Import("Empty statement: no data rows".into()));
        }
        if skipped_rows > 0 {
            info!("Skipped {} malformed rows", skipped_rows);
        }

        // local rules first; a hit is treated as ground truth
        for draft in drafts.iter_mut() {
            let text = format!("{} {}", draft.title, draft.description);
            if let Some(category) = self.rules.categorize(&text) {
                draft.category = Some(category);
                draft.confidence = Some(1.0);
            }
        }

        // AI fallback, batched over whatever the rules skipped
        let missing: Vec<usize> = drafts
            .iter()
            .enumerate()
            .filter(|(_, d)| d.category.is_none())
            .map(|(i, _)| i)
            .collect();

        let mut ai_used_for = 0;
        if !missing.is_empty() {
            if let Some(client) = &self.ai {
                ai_used_for = missing.len();
                debug!("Routing {} drafts to the AI fallback", ai_used_for);

                let items: Vec<ClassifyRequestItem> = missing
                    .iter()
                    .map(|&i| {
                        let d = &drafts[i];
                        ClassifyRequestItem {
                            id: d.id.clone(),
                            title: d.title.clone(),
                            description: d.description.clone(),
                            // direction re-applied for the service's benefit
                            amount: d.signed_amount(),
                            date: format!("{}T00:00:00Z", d.date.format("%Y-%m-%d")),
                        }
                    })
                    .collect();

                let classifications = ai::classify_batch(client, &items).await;
                for (&i, c) in missing.iter().zip(classifications.iter()) {
                    let draft = &mut drafts[i];
                    draft.category = Some(c.category);
                    draft.confidence = c.confidence;
                    draft.direction = c.direction;
                }
            }
        }

        // reserved fallback for anything still uncategorized
        for draft in drafts.iter_mut() {
            if draft.category.is_none() {
                draft.category = Some(Category::Outros);
            }
        }

        // idempotent bulk upsert keyed by the derived identifier
        let stats = self.db.upsert_transactions(&drafts)?;

        info!(
            "Import complete: {} inserted, {} updated, {} rows, {} via AI",
            stats.inserted, stats.updated, total_rows, ai_used_for
        );

        Ok(ImportSummary {
            imported: stats.inserted,
            updated: stats.updated,
            total_rows,
            ai_used_for,
        })
    }
}
