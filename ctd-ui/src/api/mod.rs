//! HTTP API handlers for ctd-ui

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub mod chart;
pub mod counts;
pub mod health;
pub mod refresh;
pub mod table;
pub mod tools;
pub mod ui;

pub use chart::tool_chart;
pub use counts::therapist_counts;
pub use health::health_routes;
pub use refresh::refresh;
pub use table::{client_table, tool_table};
pub use tools::list_tools;
pub use ui::{serve_app_js, serve_index};

/// Handler errors
#[derive(Debug)]
pub enum ApiError {
    UnknownTool(String),
    UnknownScore(String),
    DatabaseError(String),
    SyncError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnknownTool(slug) => {
                (StatusCode::BAD_REQUEST, format!("Unknown tool: {}", slug))
            }
            ApiError::UnknownScore(col) => {
                (StatusCode::BAD_REQUEST, format!("Unknown score column: {}", col))
            }
            ApiError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
            ApiError::SyncError(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Refresh failed: {}", msg))
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// The selector sends "All" (or nothing) for the unfiltered view
pub(crate) fn therapist_filter(raw: Option<String>) -> Option<String> {
    raw.filter(|name| !name.is_empty() && name != "All")
}
