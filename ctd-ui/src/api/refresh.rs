//! Refresh action

use axum::extract::State;
use axum::Json;
use ctd_common::db::models::SyncSummary;
use tracing::{error, info};

use super::ApiError;
use crate::AppState;

/// POST /api/refresh
///
/// Re-pulls the whole workbook and replaces the store contents. Readers
/// keep the previous contents until the sync transaction commits.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<SyncSummary>, ApiError> {
    info!("Refresh requested");
    let summary = ctd_si::sync::full_refresh(&state.db, &state.sheets)
        .await
        .map_err(|e| {
            error!("Refresh failed: {e}");
            ApiError::SyncError(e.to_string())
        })?;
    Ok(Json(summary))
}
