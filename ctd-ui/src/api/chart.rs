//! Trajectory chart endpoint

use axum::extract::{Path, Query, State};
use axum::Json;
use ctd_common::db::queries;
use ctd_common::Tool;
use serde::Deserialize;
use tracing::error;

use super::{therapist_filter, ApiError};
use crate::chart::{build_chart, ChartSeries};
use crate::AppState;

/// Query parameters for chart rendering
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    /// Score column to chart; defaults to the tool's primary score
    pub score: Option<String>,
    /// Therapist filter; absent or "All" selects everyone
    pub therapist: Option<String>,
}

/// GET /api/tool/:tool/chart
///
/// Trajectory series for one tool and score column: one line per client,
/// a mean line when more than one client is present, and the tool's
/// severity bands.
pub async fn tool_chart(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartSeries>, ApiError> {
    let tool = Tool::from_slug(&slug).ok_or(ApiError::UnknownTool(slug))?;
    let score = query
        .score
        .as_deref()
        .unwrap_or_else(|| tool.primary_score_column());
    if !tool.score_columns().contains(&score) {
        return Err(ApiError::UnknownScore(score.to_string()));
    }
    let therapist = therapist_filter(query.therapist);

    // A failed query charts as "no data", it never breaks the page
    let points = match queries::score_points(&state.db, tool, score, therapist.as_deref()).await {
        Ok(points) => points,
        Err(e) => {
            error!("Failed to load {tool} chart data: {e}");
            Vec::new()
        }
    };

    Ok(Json(build_chart(&points, tool.severity_bands())))
}
