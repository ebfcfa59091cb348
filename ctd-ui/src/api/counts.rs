//! Therapist aggregate counts

use axum::extract::State;
use axum::Json;
use ctd_common::db::queries::{self, TherapistCounts};

use super::ApiError;
use crate::AppState;

/// GET /api/therapists
///
/// Per-therapist distinct client counts, overall and per tool. Tools with
/// no respondents still appear with a zero count.
pub async fn therapist_counts(
    State(state): State<AppState>,
) -> Result<Json<Vec<TherapistCounts>>, ApiError> {
    queries::therapist_counts(&state.db)
        .await
        .map(Json)
        .map_err(|e| ApiError::DatabaseError(e.to_string()))
}
