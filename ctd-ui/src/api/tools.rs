//! Available-tools listing

use axum::extract::State;
use axum::Json;
use ctd_common::db::queries;
use ctd_common::Tool;
use serde::Serialize;
use tracing::error;

use crate::AppState;

/// One chartable tool, as shown in the dashboard
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub slug: &'static str,
    pub label: &'static str,
    pub sheet_name: String,
    pub score_columns: &'static [&'static str],
    pub primary_score: &'static str,
}

/// GET /api/tools
///
/// Non-excluded registry entries that map to a known tool. Registry tabs
/// without a tool mapping are registered but not listed here.
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolInfo>> {
    let names = match queries::available_tools(&state.db).await {
        Ok(names) => names,
        Err(e) => {
            error!("Failed to read sheet registry: {e}");
            Vec::new()
        }
    };

    let tools = names
        .into_iter()
        .filter_map(|name| {
            Tool::from_sheet_name(&name).map(|tool| ToolInfo {
                slug: tool.slug(),
                label: tool.label(),
                sheet_name: name,
                score_columns: tool.score_columns(),
                primary_score: tool.primary_score_column(),
            })
        })
        .collect();
    Json(tools)
}
