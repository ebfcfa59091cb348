//! Table views: per-tool session-ranked responses and the client roster

use axum::extract::{Path, Query, State};
use axum::Json;
use ctd_common::db::queries::{self, DataTable};
use ctd_common::Tool;
use serde::Deserialize;
use tracing::error;

use super::{therapist_filter, ApiError};
use crate::AppState;

/// Query parameters for table views
#[derive(Debug, Deserialize)]
pub struct TableQuery {
    /// Therapist filter; absent or "All" selects everyone
    pub therapist: Option<String>,
}

/// GET /api/tool/:tool
///
/// Session-ranked response table for one tool. A query failure is logged
/// and rendered as an empty table so the other tools keep working.
pub async fn tool_table(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<TableQuery>,
) -> Result<Json<DataTable>, ApiError> {
    let tool = Tool::from_slug(&slug).ok_or(ApiError::UnknownTool(slug))?;
    let therapist = therapist_filter(query.therapist);

    match queries::tool_responses(&state.db, tool, therapist.as_deref()).await {
        Ok(table) => Ok(Json(table)),
        Err(e) => {
            error!("Failed to load {tool} data: {e}");
            let mut columns: Vec<String> = tool
                .response_columns()
                .iter()
                .map(|c| c.to_string())
                .collect();
            columns.push("therapist".to_string());
            columns.push("session".to_string());
            Ok(Json(DataTable::empty(columns)))
        }
    }
}

/// GET /api/clients
///
/// The client roster.
pub async fn client_table(State(state): State<AppState>) -> Result<Json<DataTable>, ApiError> {
    queries::list_clients(&state.db)
        .await
        .map(Json)
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
}
