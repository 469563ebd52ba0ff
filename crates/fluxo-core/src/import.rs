//! Statement parsing: raw CSV rows into typed drafts
//!
//! One delimited pt-BR export layout is supported: header row with `Data`
//! (DD/MM/YYYY), `Valor` (comma-decimal, `-` prefix for debits) and a
//! `Descrição` and/or `Identificador` column. Malformed rows are dropped
//! individually; they never fail the batch.

use std::io::Read;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Direction, Draft};
use crate::normalize::TextNormalizer;

/// Column names recognized in the statement export
const COL_DATE: &str = "Data";
const COL_VALUE: &str = "Valor";
const COL_DESCRIPTION: &str = "Descrição";
const COL_IDENTIFIER: &str = "Identificador";

/// Placeholder title when the export carries neither description nor identifier
const FALLBACK_TITLE: &str = "Transação";

/// Hex length of derived identifiers
///
/// Collision risk at this truncation is accepted for this volume; ids only
/// need to be practically unique, not cryptographically collision-free.
const STABLE_ID_LEN: usize = 24;

/// Outcome of parsing one statement file
#[derive(Debug)]
pub struct ParsedStatement {
    pub drafts: Vec<Draft>,
    /// Data rows seen in the file, including rows that failed to parse
    pub total_rows: usize,
    /// Rows dropped due to a malformed date or amount
    pub skipped_rows: usize,
}

/// Parse a statement export into drafts
pub fn parse_statement<R: Read>(reader: R, normalizer: &TextNormalizer) -> Result<ParsedStatement> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_col = find_column(&headers, COL_DATE);
    let value_col = find_column(&headers, COL_VALUE);
    let desc_col = find_column(&headers, COL_DESCRIPTION);
    let ident_col = find_column(&headers, COL_IDENTIFIER);

    let (date_col, value_col) = match (date_col, value_col) {
        (Some(d), Some(v)) => (d, v),
        _ => {
            return Err(Error::Import(format!(
                "Statement header missing {} or {} column",
                COL_DATE, COL_VALUE
            )))
        }
    };

    let mut drafts = Vec::new();
    let mut total_rows = 0usize;
    let mut skipped_rows = 0usize;

    for result in rdr.records() {
        let record = result?;
        total_rows += 1;

        match parse_row(&record, date_col, value_col, desc_col, ident_col, normalizer) {
            Ok(draft) => drafts.push(draft),
            Err(e) => {
                skipped_rows += 1;
                warn!("Skipping malformed row {}: {}", total_rows, e);
            }
        }
    }

    debug!(
        "Parsed {} drafts from {} rows ({} skipped)",
        drafts.len(),
        total_rows,
        skipped_rows
    );

    Ok(ParsedStatement {
        drafts,
        total_rows,
        skipped_rows,
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Pure function of one row: exactly one draft or a row-level failure
fn parse_row(
    record: &csv::StringRecord,
    date_col: usize,
    value_col: usize,
    desc_col: Option<usize>,
    ident_col: Option<usize>,
    normalizer: &TextNormalizer,
) -> Result<Draft> {
    let date_str = record
        .get(date_col)
        .ok_or_else(|| Error::MalformedRow("Missing date field".into()))?;
    let date = parse_br_date(date_str)?;

    let value_str = record
        .get(value_col)
        .ok_or_else(|| Error::MalformedRow("Missing value field".into()))?;
    let signed = parse_br_amount(value_str)?;
    let direction = Direction::from_signed(signed);

    let raw_description = desc_col
        .and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let identifier = ident_col
        .and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let raw_title = raw_description.or(identifier).unwrap_or(FALLBACK_TITLE);
    let normalized = normalizer.normalize(raw_title, raw_description);

    // identity is assigned here, once, and never recomputed downstream
    let id = match identifier {
        Some(external) => external.to_string(),
        None => stable_id(&date, &normalized.title, signed),
    };

    Ok(Draft {
        id,
        title: normalized.title,
        description: normalized.description,
        amount: signed.abs(),
        direction,
        date,
        category: None,
        confidence: None,
    })
}

/// Parse a `DD/MM/YYYY` date; any other shape fails that row only
pub fn parse_br_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .map_err(|_| Error::MalformedRow(format!("Unable to parse date: {}", s)))
}

/// Parse a pt-BR amount: `.` is a thousands separator, `,` the decimal mark
pub fn parse_br_amount(s: &str) -> Result<f64> {
    let cleaned = s.trim().replace('.', "").replace(',', ".");
    cleaned
        .parse::<f64>()
        .map_err(|_| Error::MalformedRow(format!("Unable to parse amount: {}", s)))
}

/// Derive the stable record identifier from the normalized triple
///
/// Same (date, title, signed amount) always yields the same id; this is what
/// makes re-importing a statement overwrite rather than duplicate.
pub fn stable_id(date: &NaiveDate, title: &str, signed_amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{:.2}", signed_amount).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..STABLE_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new().unwrap()
    }

    #[test]
    fn test_parse_br_date() {
        assert_eq!(
            parse_br_date("05/03/2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
        );
        assert!(parse_br_date("2025-03-05").is_err());
        assert!(parse_br_date("05-03-2025").is_err());
        assert!(parse_br_date("31/02/2025").is_err());
    }

    #[test]
    fn test_parse_br_amount() {
        assert_eq!(parse_br_amount("-45,90").unwrap(), -45.90);
        assert_eq!(parse_br_amount("2.500,00").unwrap(), 2500.00);
        assert_eq!(parse_br_amount("0,00").unwrap(), 0.0);
        assert!(parse_br_amount("abc").is_err());
    }

    #[test]
    fn test_stable_id_deterministic() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let a = stable_id(&date, "Posto", -45.90);
        let b = stable_id(&date, "Posto", -45.90);
        assert_eq!(a, b);
        assert_eq!(a.len(), 24);
        // any component change produces a different id
        assert_ne!(a, stable_id(&date, "Posto", 45.90));
        assert_ne!(a, stable_id(&date, "Shell", -45.90));
    }

    #[test]
    fn test_parse_statement_scenario() {
        let csv = "Data,Valor,Descrição\n\
                   05/03/2025,\"-45,90\",Compra no débito - POSTO SHELL RIO DE JANEIRO RJ\n";
        let parsed = parse_statement(csv.as_bytes(), &normalizer()).unwrap();
        assert_eq!(parsed.total_rows, 1);
        assert_eq!(parsed.drafts.len(), 1);

        let draft = &parsed.drafts[0];
        assert_eq!(draft.title, "Posto");
        assert_eq!(draft.description, "compra no débito posto");
        assert_eq!(draft.amount, 45.90);
        assert_eq!(draft.direction, Direction::Expense);
        assert!(draft.category.is_none());
    }

    #[test]
    fn test_parse_statement_uses_external_identifier() {
        let csv = "Data,Valor,Descrição,Identificador\n\
                   10/01/2025,\"100,00\",Transferência recebida pelo Pix - JOAO,abc-ext-id-1\n";
        let parsed = parse_statement(csv.as_bytes(), &normalizer()).unwrap();
        assert_eq!(parsed.drafts[0].id, "abc-ext-id-1");
    }

    #[test]
    fn test_parse_statement_skips_malformed_rows() {
        let csv = "Data,Valor,Descrição\n\
                   05/03/2025,\"-45,90\",Compra no débito - POSTO SHELL\n\
                   not-a-date,\"-10,00\",Lanche\n\
                   06/03/2025,garbage,Lanche\n\
                   07/03/2025,\"-12,50\",PIZZARIA CASA NOSSA\n";
        let parsed = parse_statement(csv.as_bytes(), &normalizer()).unwrap();
        assert_eq!(parsed.total_rows, 4);
        assert_eq!(parsed.skipped_rows, 2);
        assert_eq!(parsed.drafts.len(), 2);
    }

    #[test]
    fn test_parse_statement_title_fallback_chain() {
        // no description column: identifier becomes the title source
        let csv = "Data,Valor,Identificador\n\
                   05/03/2025,\"-45,90\",pix-e2e-777\n";
        let parsed = parse_statement(csv.as_bytes(), &normalizer()).unwrap();
        assert_eq!(parsed.drafts[0].id, "pix-e2e-777");
        assert!(!parsed.drafts[0].title.is_empty());

        // neither column: fixed placeholder
        let csv = "Data,Valor\n05/03/2025,\"-45,90\"\n";
        let parsed = parse_statement(csv.as_bytes(), &normalizer()).unwrap();
        assert_eq!(parsed.drafts[0].title, "Transacao");
    }

    #[test]
    fn test_parse_statement_missing_required_columns() {
        let csv = "Some,Other,Headers\na,b,c\n";
        assert!(parse_statement(csv.as_bytes(), &normalizer()).is_err());
    }

    #[test]
    fn test_zero_amount_is_income() {
        let csv = "Data,Valor,Descrição\n05/03/2025,\"0,00\",Ajuste\n";
        let parsed = parse_statement(csv.as_bytes(), &normalizer()).unwrap();
        assert_eq!(parsed.drafts[0].direction, Direction::Income);
    }
}
