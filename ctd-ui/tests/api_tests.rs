//! Integration tests for ctd-ui API endpoints
//!
//! Builds the router over a temp-file store seeded through a real sync run,
//! then exercises the endpoints with in-process requests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ctd_common::Tool;
use ctd_si::sheets::{SheetSet, SheetTable, SheetsClient};
use ctd_si::sync::run_sync;
use ctd_ui::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: on-disk store in a temp dir, seeded through a full sync
async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("Should create temp dir");
    let db_path = dir.path().join("ctd.db");
    let pool = ctd_common::db::init_database(&db_path)
        .await
        .expect("Should initialize database");
    run_sync(&pool, &fixture_source())
        .await
        .expect("Should sync fixture data");
    (pool, dir)
}

/// Test helper: app over the seeded store; the sheets client never gets
/// called by the endpoints under test
fn setup_app(db: SqlitePool) -> axum::Router {
    let state = AppState::new(db, SheetsClient::new("test-spreadsheet", "test-key"));
    build_router(state)
}

/// Test helper: create request
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn sheet(cells: &[&[&str]]) -> SheetTable {
    SheetTable::from_values(
        cells
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

/// Two clients under T1, one under T2, EPDS trajectories for C1 and C2
fn fixture_source() -> SheetSet {
    SheetSet::new(vec![
        (
            "Clients".to_string(),
            sheet(&[
                &["ID", "Counsellor Assn`", "Age", "Gender", "Client Type", "county"],
                &["C1", "T1", "31", "F", "Adult", "North"],
                &["C2", "T1", "45", "M", "Adult", "South"],
                &["C3", "T2", "28", "F", "Youth", "East"],
            ]),
        ),
        (
            Tool::Epds.sheet_name().to_string(),
            sheet(&[
                &[
                    "Timestamp",
                    "Client Code",
                    "EPDS Total Score (Max 30)",
                    "Severity Descriptor",
                    "Item 10 (Harming Self) Raw Score",
                    "Suicidality Flag (Clinical Alert)",
                    "Column 1",
                ],
                &["2024-01-10 09:00:00", "C1", "20", "Moderate", "0", "No", ""],
                &["2024-02-10 09:00:00", "C1", "10", "Mild", "0", "No", ""],
                &["2024-01-15 09:00:00", "C2", "14", "Moderate", "1", "Yes", ""],
            ]),
        ),
        ("Assessment Tools".to_string(), sheet(&[&["Tool"]])),
    ])
}

// ============================================================================
// Health endpoint
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ctd-ui");
    assert!(body["version"].is_string());
}

// ============================================================================
// Tool listing
// ============================================================================

#[tokio::test]
async fn test_list_tools_reflects_registry() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(test_request("GET", "/api/tools")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let tools = body.as_array().unwrap();
    // Only the EPDS scoring tab was present and non-excluded
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["slug"], "epds");
    assert_eq!(tools[0]["primary_score"], "total_score");
    assert!(tools[0]["score_columns"]
        .as_array()
        .unwrap()
        .contains(&Value::String("total_score".to_string())));
}

// ============================================================================
// Table views
// ============================================================================

#[tokio::test]
async fn test_tool_table_with_session_ranks() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/tool/epds"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let columns: Vec<String> = body["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();
    assert!(columns.contains(&"session".to_string()));
    assert!(columns.contains(&"therapist".to_string()));

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    let session_idx = columns.iter().position(|c| c == "session").unwrap();
    let score_idx = columns.iter().position(|c| c == "total_score").unwrap();
    // C1 rows come first, ranked 1 then 2 by ascending timestamp
    assert_eq!(rows[0][session_idx], 1);
    assert_eq!(rows[0][score_idx], 20);
    assert_eq!(rows[1][session_idx], 2);
    assert_eq!(rows[1][score_idx], 10);
}

#[tokio::test]
async fn test_tool_table_therapist_filter() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/tool/epds?therapist=T2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 0);

    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);
    let response = app
        .oneshot(test_request("GET", "/api/tool/epds?therapist=All"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_tool_rejected() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/tool/phq9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("phq9"));
}

#[tokio::test]
async fn test_client_roster() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/clients"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["columns"][0], "id");
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);
}

// ============================================================================
// Charts
// ============================================================================

#[tokio::test]
async fn test_chart_mean_and_bands() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/tool/epds/chart"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["clients"].as_array().unwrap().len(), 2);
    // Two clients share session 1: mean = (20 + 14) / 2
    let mean = body["mean"].as_array().unwrap();
    assert_eq!(mean[0]["session"], 1);
    assert_eq!(mean[0]["score"], 17.0);
    assert_eq!(body["bands"].as_array().unwrap().len(), 4);
    assert_eq!(body["max_session"], 2);
}

#[tokio::test]
async fn test_chart_secondary_score_column() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/tool/epds/chart?therapist=T1&score=item_10_raw_score"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    // Both T1 clients responded, so the mean is present even for the
    // secondary score column
    assert_eq!(body["clients"].as_array().unwrap().len(), 2);
    assert!(body["mean"].is_array());
}

#[tokio::test]
async fn test_chart_unknown_score_rejected() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/tool/epds/chart?score=shoe_size"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Therapist aggregates
// ============================================================================

#[tokio::test]
async fn test_therapist_counts() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db);

    let response = app
        .oneshot(test_request("GET", "/api/therapists"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let counts = body.as_array().unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0]["therapist"], "T1");
    assert_eq!(counts[0]["total_clients"], 2);
    assert_eq!(counts[0]["epds"], 2);
    assert_eq!(counts[1]["therapist"], "T2");
    assert_eq!(counts[1]["epds"], 0);
}

// ============================================================================
// Embedded UI
// ============================================================================

#[tokio::test]
async fn test_serves_index_and_app_js() {
    let (db, _dir) = setup_test_db().await;
    let app = setup_app(db.clone());

    let response = app.oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("CTD Assessment Dashboard"));

    let app = setup_app(db);
    let response = app
        .oneshot(test_request("GET", "/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/javascript"
    );
}
