//! Fluxo Core Library
//!
//! Shared functionality for the Fluxo personal finance dashboard:
//! - Statement parsing (pt-BR CSV exports) into typed drafts
//! - Title/description normalization for noisy bank descriptions
//! - Deterministic record identity for idempotent imports
//! - Local rule-based categorization
//! - AI fallback classification with graceful degradation
//! - SQLite record store and dashboard aggregation

pub mod ai;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod rules;

/// Test utilities including the mock classification server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AiBackend, AiClient, AiConfig, Classification, MockBackend, OpenAiCompatibleBackend};
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    Category, DashboardSummary, Direction, Draft, ImportSummary, Transaction, TransferPolicy,
    UpsertStats,
};
pub use pipeline::ImportPipeline;
pub use rules::RuleSet;
