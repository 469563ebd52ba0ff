//! Statement import and transaction listing handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, MAX_PAGE_LIMIT, MAX_UPLOAD_SIZE};
use fluxo_core::models::{ImportSummary, Transaction};
use fluxo_core::pipeline::ImportPipeline;

/// POST /api/transactions - import one statement export
///
/// Expects multipart form with:
/// - file: CSV statement export (required, max 10MB)
pub async fn import_statement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut total_size: usize = 0;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;
            total_size += bytes.len();

            // Check file size limit
            if total_size > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }

            file_data = Some(bytes.to_vec());
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    run_import(&state, file_data).await
}

/// Request body for the JSON import variant
#[derive(Debug, Deserialize)]
pub struct ImportJsonRequest {
    /// Base64-encoded CSV content
    pub csv_data: String,
}

/// POST /api/transactions/json - import via JSON body (used by tests)
pub async fn import_statement_json(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportJsonRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    use base64::Engine;

    let file_data = base64::engine::general_purpose::STANDARD
        .decode(&req.csv_data)
        .map_err(|e| AppError::bad_request(&format!("Invalid base64 data: {}", e)))?;

    if file_data.len() > MAX_UPLOAD_SIZE {
        return Err(AppError::bad_request(&format!(
            "File too large. Maximum size is {} MB",
            MAX_UPLOAD_SIZE / 1024 / 1024
        )));
    }

    run_import(&state, file_data).await
}

/// Core import logic shared by the multipart and JSON entry points
async fn run_import(
    state: &AppState,
    file_data: Vec<u8>,
) -> Result<Json<ImportSummary>, AppError> {
    if file_data.is_empty() {
        return Err(AppError::bad_request("Empty statement upload"));
    }

    let pipeline = ImportPipeline::new(state.db.clone(), state.ai.clone())?;
    let summary = pipeline
        .run(file_data.as_slice())
        .await
        .map_err(|e| match e {
            // empty or unusable statements are a 400, not a 500
            fluxo_core::Error::Import(msg) => AppError::bad_request(&msg),
            other => AppError::from(other),
        })?;

    info!(
        "Statement import: {} inserted, {} updated, {} rows, {} via AI",
        summary.imported, summary.updated, summary.total_rows, summary.ai_used_for
    );

    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Listing envelope consumed by the dashboard UI
#[derive(Serialize)]
pub struct ListResponse {
    pub ok: bool,
    pub count: usize,
    pub data: Vec<Transaction>,
}

/// GET /api/transactions - most recent records, date-descending
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, MAX_PAGE_LIMIT);
    let data = state.db.list_recent(limit)?;
    Ok(Json(ListResponse {
        ok: true,
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ByMonthQuery {
    pub year: i32,
    pub month: u32,
}

/// GET /api/transactions/by-month - one calendar month, date-ascending
pub async fn list_by_month(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ByMonthQuery>,
) -> Result<Json<ListResponse>, AppError> {
    if !(1..=12).contains(&query.month) {
        return Err(AppError::bad_request(&format!(
            "Invalid month: {}",
            query.month
        )));
    }

    let data = state.db.list_by_month(query.year, query.month)?;
    Ok(Json(ListResponse {
        ok: true,
        count: data.len(),
        data,
    }))
}
