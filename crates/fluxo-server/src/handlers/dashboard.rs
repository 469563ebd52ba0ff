//! Dashboard summary and health handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use fluxo_core::models::DashboardSummary;

/// GET /api/dashboard - aggregate summary for the dashboard UI
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.db.dashboard_summary()?))
}

/// GET /api/health - liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
