//! Title and description normalization
//!
//! Statement descriptions embed a payment channel ("Compra no débito - ...")
//! and an address tail ("... RIO DE JANEIRO RJ") that add noise to keyword
//! matching and make stored titles hard to scan. This module collapses them
//! to a short canonical merchant token and a templated description.

use regex::Regex;

use crate::error::Result;
use crate::models::PaymentMethod;

/// Normalized title/description pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub title: String,
    pub description: String,
}

/// Text normalizer with pre-compiled patterns
pub struct TextNormalizer {
    /// Ordered method patterns, most specific first; first match wins
    method_rules: Vec<(Regex, PaymentMethod)>,
    /// Two-letter region codes (RJ, SP, ...)
    region_code: Regex,
    /// Common address filler words
    filler_words: Regex,
    whitespace: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        let method_rules = vec![
            (
                Regex::new(r"(?i)\bd[eé]bito\s+autom[aá]tico\b")?,
                PaymentMethod::DebitoAutomatico,
            ),
            (Regex::new(r"(?i)\bd[eé]bito\b")?, PaymentMethod::Debito),
            (Regex::new(r"(?i)\bcr[eé]dito\b")?, PaymentMethod::Credito),
            (Regex::new(r"(?i)\bpix\b")?, PaymentMethod::Pix),
            (
                Regex::new(r"(?i)\b(transfer[eê]ncia|ted|doc)\b")?,
                PaymentMethod::Transferencia,
            ),
            (Regex::new(r"(?i)\bboleto\b")?, PaymentMethod::Boleto),
            (
                Regex::new(r"(?i)\b(assinatura|subscription)\b")?,
                PaymentMethod::Assinatura,
            ),
        ];

        Ok(Self {
            method_rules,
            region_code: Regex::new(r"\b[A-Z]{2}\b")?,
            filler_words: Regex::new(r"(?i)\b(RIO|DAS|DOS|DO|DE|DA|OSTRAS?)\b")?,
            whitespace: Regex::new(r"\s{2,}")?,
        })
    }

    /// Normalize a raw title and optional raw description.
    ///
    /// Example: `"Compra no débito - CALEBITO RIO DAS OSTRA"` becomes
    /// `{ title: "Calebito", description: "compra no débito calebito" }`.
    pub fn normalize(&self, raw_title: &str, raw_description: Option<&str>) -> Normalized {
        let base = raw_description
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| raw_title.trim());

        let method = self
            .extract_method(base)
            .or_else(|| self.extract_method(raw_title));

        let merchant = self.clean_merchant(base);

        let mut description = match method {
            Some(m) => format!("compra no {}", m.label()),
            None => "compra".to_string(),
        };
        description.push(' ');
        description.push_str(&merchant.to_lowercase());
        let description = self
            .whitespace
            .replace_all(description.trim(), " ")
            .to_string();

        Normalized {
            title: merchant,
            description,
        }
    }

    fn extract_method(&self, text: &str) -> Option<PaymentMethod> {
        self.method_rules
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, method)| *method)
    }

    /// Reduce a raw merchant string to a short brand token
    fn clean_merchant(&self, raw: &str) -> String {
        // keep the trailing segment when the bank prefixes a channel phrase
        let tail = raw.rsplit(" - ").next().unwrap_or(raw);

        let cleaned = self.region_code.replace_all(tail, "");
        let cleaned = self.filler_words.replace_all(&cleaned, "");
        let cleaned = self
            .whitespace
            .replace_all(cleaned.trim(), " ")
            .into_owned();

        let mut words = cleaned.split_whitespace();
        let first = words.next().unwrap_or("");
        // very short first words are usually leftovers, prefer the next one
        let token = if first.chars().count() >= 3 {
            first
        } else {
            words.next().unwrap_or(first)
        };

        if token.is_empty() {
            // everything was stripped away, fall back to the raw input
            return title_case(raw.trim());
        }
        title_case(token)
    }
}

/// Fold common Latin-1 accented characters to ASCII
///
/// Accented merchant names render differently across bank exports and
/// platforms; folding keeps identity derivation and rule matching stable.
pub fn fold_diacritics(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            'Ñ' => 'N',
            _ => c,
        })
        .collect()
}

/// Lowercase, strip diacritics, and capitalize word starts
fn title_case(s: &str) -> String {
    let folded = fold_diacritics(&s.to_lowercase());
    let mut out = String::with_capacity(folded.len());
    let mut at_word_start = true;
    for c in folded.chars() {
        if at_word_start && c.is_ascii_alphabetic() {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}
