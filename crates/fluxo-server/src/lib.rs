//! Fluxo Web Server
//!
//! Axum-based REST API for the Fluxo personal finance dashboard:
//! statement upload, transaction listing, and the dashboard summary.
//! The ingestion/categorization work itself lives in fluxo-core; handlers
//! here only frame requests and responses.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::{Any, CorsLayer}, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use fluxo_core::ai::{AiBackend, AiClient};
use fluxo_core::db::Database;

mod handlers;


/// Maximum statement upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum listing page size
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub ai: Option<AiClient>,
}

/// Create the application router
pub fn create_router(db: Database, ai: Option<AiClient>, static_dir: Option<&str>) -> Router {
    if let Some(ref client) = ai {
        info!(
            "AI fallback configured: {} (model: {})",
            client.endpoint(),
            client.model()
        );
    } else {
        info!("AI fallback not configured (set FLUXO_AI_ENDPOINT to enable); unmatched rows fall back to Outros");
    }

    let state = Arc::new(AppState { db, ai });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
        // Transactions: statement upload + listing
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::import_statement),
        )
        .route("/transactions/json", post(handlers::import_statement_json))
        .route("/transactions/by-month", get(handlers::list_by_month))
        .with_state(state);

    let mut app = Router::new().nest("/api", api_routes);

    // serve the built dashboard UI when a static dir is configured
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_origin(Any)
            .allow_headers(Any),
    )
    .layer(TraceLayer::new_for_http())
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

/// Bind and serve the router until the process is terminated
pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
