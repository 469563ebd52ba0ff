//! Import command implementation

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use fluxo_core::{ai::AiClient, pipeline::ImportPipeline};

use super::open_db;

pub async fn cmd_import(db_path: &Path, file: &Path, no_ai: bool) -> Result<()> {
    println!("📥 Importing {}...", file.display());

    let db = open_db(db_path)?;

    let ai = if no_ai { None } else { AiClient::from_env() };
    if ai.is_none() && !no_ai {
        println!("   AI fallback not configured (set FLUXO_AI_ENDPOINT); unmatched rows become Outros");
    }

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    let pipeline = ImportPipeline::new(db, ai)?;
    let summary = pipeline.run(csv_file).await?;

    println!("✅ Import complete!");
    println!("   Imported: {}", summary.imported);
    println!("   Updated: {}", summary.updated);
    println!("   Rows seen: {}", summary.total_rows);
    println!("   AI fallback used for: {}", summary.ai_used_for);

    Ok(())
}
