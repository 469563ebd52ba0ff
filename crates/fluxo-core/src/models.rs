//! Domain models for Fluxo

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Closed spending category vocabulary
///
/// Shared contract between the local rule classifier and the AI fallback.
/// Labels are the accented pt-BR strings everywhere: storage, API responses,
/// and the classification service request/response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Alimentação")]
    Alimentacao,
    #[serde(rename = "Mercado")]
    Mercado,
    #[serde(rename = "Transporte")]
    Transporte,
    #[serde(rename = "Streaming")]
    Streaming,
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "Lazer")]
    Lazer,
    #[serde(rename = "Assinaturas")]
    Assinaturas,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Moradia")]
    Moradia,
    #[serde(rename = "Serviços")]
    Servicos,
    #[serde(rename = "Fatura")]
    Fatura,
    #[serde(rename = "Entradas")]
    Entradas,
    /// Reserved fallback when no classifier produces a confident result
    #[serde(rename = "Outros")]
    Outros,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 13] = [
        Category::Alimentacao,
        Category::Mercado,
        Category::Transporte,
        Category::Streaming,
        Category::Saude,
        Category::Lazer,
        Category::Assinaturas,
        Category::Educacao,
        Category::Moradia,
        Category::Servicos,
        Category::Fatura,
        Category::Entradas,
        Category::Outros,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alimentacao => "Alimentação",
            Self::Mercado => "Mercado",
            Self::Transporte => "Transporte",
            Self::Streaming => "Streaming",
            Self::Saude => "Saúde",
            Self::Lazer => "Lazer",
            Self::Assinaturas => "Assinaturas",
            Self::Educacao => "Educação",
            Self::Moradia => "Moradia",
            Self::Servicos => "Serviços",
            Self::Fatura => "Fatura",
            Self::Entradas => "Entradas",
            Self::Outros => "Outros",
        }
    }

    /// Resolve a label to a category, accepting both accented and plain
    /// spellings (the classification service is not reliable about accents)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "alimentação" | "alimentacao" => Some(Self::Alimentacao),
            "mercado" => Some(Self::Mercado),
            "transporte" => Some(Self::Transporte),
            "streaming" => Some(Self::Streaming),
            "saúde" | "saude" => Some(Self::Saude),
            "lazer" => Some(Self::Lazer),
            "assinaturas" => Some(Self::Assinaturas),
            "educação" | "educacao" => Some(Self::Educacao),
            "moradia" => Some(Self::Moradia),
            "serviços" | "servicos" => Some(Self::Servicos),
            "fatura" => Some(Self::Fatura),
            "entradas" => Some(Self::Entradas),
            "outros" => Some(Self::Outros),
            _ => None,
        }
    }

    /// Resolve a label, rewriting anything outside the closed vocabulary
    /// to the reserved fallback
    pub fn clamped(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Self::Outros)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a transaction; the draft amount itself is always unsigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Derive direction from a signed statement value. Zero is income.
    pub fn from_signed(amount: f64) -> Self {
        if amount >= 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment channel detected in the raw statement description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    DebitoAutomatico,
    Debito,
    Credito,
    Pix,
    Transferencia,
    Boleto,
    Assinatura,
}

impl PaymentMethod {
    /// Display label used when composing record descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Self::DebitoAutomatico => "débito automático",
            Self::Debito => "débito",
            Self::Credito => "crédito",
            Self::Pix => "pix",
            Self::Transferencia => "transferência",
            Self::Boleto => "boleto",
            Self::Assinatura => "assinatura",
        }
    }
}

/// An in-flight transaction during one ingestion call (not yet persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    /// Stable identifier; assigned at parse time and never recomputed
    pub id: String,
    /// Short canonical merchant/payee name
    pub title: String,
    /// Templated human-readable description
    pub description: String,
    /// Unsigned magnitude; sign is carried by `direction`
    pub amount: f64,
    pub direction: Direction,
    pub date: NaiveDate,
    /// Absent until a classifier assigns one
    pub category: Option<Category>,
    /// Classifier confidence in [0,1], when one was stated
    pub confidence: Option<f64>,
}

impl Draft {
    /// Signed value as the source statement carried it
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            Direction::Income => self.amount,
            Direction::Expense => -self.amount,
        }
    }
}

/// A persisted transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub direction: Direction,
    pub date: NaiveDate,
    pub category: Category,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response shape of one import call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Records inserted for the first time
    pub imported: usize,
    /// Records overwritten under an existing identifier
    pub updated: usize,
    /// Data rows seen in the uploaded file, malformed rows included
    pub total_rows: usize,
    /// Drafts routed through the AI fallback classifier
    pub ai_used_for: usize,
}

/// Outcome counts of one bulk upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub updated: usize,
}

/// Expense total for one category (dashboard)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub transaction_count: i64,
}

/// Aggregate summary served to the dashboard UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub income_total: f64,
    pub expense_total: f64,
    pub balance: f64,
    pub total_transactions: i64,
    pub expenses_by_category: Vec<CategoryTotal>,
}

/// Default routing for transfers whose purpose the statement does not reveal
///
/// An outgoing PIX with no merchant signal could be rent, a service, or a
/// gift; which bucket it lands in is policy, not a derived fact.
#[derive(Debug, Clone, Copy)]
pub struct TransferPolicy {
    /// Category for outgoing PIX/transfers with no other signal
    pub outgoing: Category,
    /// Category for incoming PIX/transfers with no other signal
    pub incoming: Category,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            outgoing: Category::Servicos,
            incoming: Category::Entradas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_category_accepts_plain_spelling() {
        assert_eq!(Category::from_label("Alimentacao"), Some(Category::Alimentacao));
        assert_eq!(Category::from_label("saude"), Some(Category::Saude));
        assert_eq!(Category::from_label("SERVICOS"), Some(Category::Servicos));
    }

    #[test]
    fn test_category_clamps_unknown_labels() {
        assert_eq!(Category::clamped("Crypto"), Category::Outros);
        assert_eq!(Category::clamped(""), Category::Outros);
        assert_eq!(Category::clamped("Transporte"), Category::Transporte);
    }

    #[test]
    fn test_category_serde_uses_accented_labels() {
        let json = serde_json::to_string(&Category::Saude).unwrap();
        assert_eq!(json, "\"Saúde\"");
        let back: Category = serde_json::from_str("\"Educação\"").unwrap();
        assert_eq!(back, Category::Educacao);
    }

    #[test]
    fn test_direction_from_signed() {
        assert_eq!(Direction::from_signed(10.0), Direction::Income);
        assert_eq!(Direction::from_signed(-0.01), Direction::Expense);
        // zero is income, not a special case
        assert_eq!(Direction::from_signed(0.0), Direction::Income);
    }

    #[test]
    fn test_draft_signed_amount() {
        let draft = Draft {
            id: "abc".into(),
            title: "Posto".into(),
            description: "compra no débito posto".into(),
            amount: 45.90,
            direction: Direction::Expense,
            date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            category: None,
            confidence: None,
        };
        assert_eq!(draft.signed_amount(), -45.90);
    }

    #[test]
    fn test_import_summary_camel_case() {
        let summary = ImportSummary {
            imported: 3,
            updated: 1,
            total_rows: 5,
            ai_used_for: 2,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalRows"], 5);
        assert_eq!(json["aiUsedFor"], 2);
    }
}
