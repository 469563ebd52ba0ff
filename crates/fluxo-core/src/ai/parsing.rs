//! JSON parsing for classification service responses
//!
//! The service is instructed to answer with strict JSON, but models sometimes
//! wrap the payload in prose. Parsing tries the raw body first, then retries
//! on the outermost matching brace pair before giving up.

use crate::error::{Error, Result};

use super::ClassifiedBatch;

/// Parse and validate a batch classification response
pub fn parse_batch_response(response: &str) -> Result<ClassifiedBatch> {
    let response = response.trim();

    let batch: ClassifiedBatch = match serde_json::from_str(response) {
        Ok(batch) => batch,
        Err(_) => {
            let start = response.find('{');
            let end = response.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => {
                    serde_json::from_str(&response[s..=e]).map_err(|err| {
                        Error::InvalidData(format!(
                            "Invalid classification JSON: {} | Raw: {}",
                            err,
                            truncate(response)
                        ))
                    })?
                }
                _ => {
                    return Err(Error::InvalidData(format!(
                        "No JSON found in classification response | Raw: {}",
                        truncate(response)
                    )))
                }
            }
        }
    };

    validate_batch(&batch)?;
    Ok(batch)
}

/// Schema checks serde cannot express: identifiers must be non-empty
fn validate_batch(batch: &ClassifiedBatch) -> Result<()> {
    for item in &batch.items {
        if item.id.trim().is_empty() {
            return Err(Error::InvalidData(
                "Classification item with empty id".into(),
            ));
        }
    }
    Ok(())
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        let short: String = s.chars().take(200).collect();
        format!("{}...", short)
    } else {
        s.to_string()
    }
}
