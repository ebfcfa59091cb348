//! ctd-ui library - Dashboard module
//!
//! Serves the clinician-facing dashboard: per-tool session-ranked tables,
//! trajectory charts with severity bands, therapist aggregates, and the
//! refresh action.

use axum::Router;
use ctd_si::sheets::SheetsClient;
use sqlx::SqlitePool;

pub mod api;
pub mod chart;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Store connection pool
    pub db: SqlitePool,
    /// Source client used by the refresh action
    pub sheets: SheetsClient,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, sheets: SheetsClient) -> Self {
        Self { db, sheets }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/tools", get(api::list_tools))
        .route("/api/therapists", get(api::therapist_counts))
        .route("/api/clients", get(api::client_table))
        .route("/api/tool/:tool", get(api::tool_table))
        .route("/api/tool/:tool/chart", get(api::tool_chart))
        .route("/api/refresh", post(api::refresh))
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
