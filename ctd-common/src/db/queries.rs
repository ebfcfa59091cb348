//! Query layer for the dashboard
//!
//! Session rank is never stored: every per-tool query computes it at read
//! time as `ROW_NUMBER() OVER (PARTITION BY client_code ORDER BY timestamp)`,
//! so a re-sync of identical source data yields identical ranks.

use crate::db::models::SheetConfigEntry;
use crate::tools::Tool;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, ValueRef};

/// A flat table ready for JSON rendering: column names plus untyped rows
#[derive(Debug, Clone, Serialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Table with the given columns and no rows
    pub fn empty(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }
}

/// One charted observation: a client's score at a session rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePoint {
    pub client: String,
    pub session: i64,
    pub score: f64,
}

/// Distinct client counts for one therapist, overall and per tool
#[derive(Debug, Clone, Serialize)]
pub struct TherapistCounts {
    pub therapist: String,
    pub total_clients: i64,
    pub epds: i64,
    pub bdi: i64,
    pub bai: i64,
    pub aceq: i64,
    pub sads: i64,
    pub asrs: i64,
}

impl TherapistCounts {
    /// Count for one tool
    pub fn for_tool(&self, tool: Tool) -> i64 {
        match tool {
            Tool::Epds => self.epds,
            Tool::Bdi => self.bdi,
            Tool::Bai => self.bai,
            Tool::AceQ => self.aceq,
            Tool::Sads => self.sads,
            Tool::Asrs => self.asrs,
        }
    }
}

/// Session-ranked response table for one tool, joined to the client roster
/// for the therapist assignment. `therapist` filters to one assignment.
pub async fn tool_responses(
    pool: &SqlitePool,
    tool: Tool,
    therapist: Option<&str>,
) -> Result<DataTable> {
    let select_cols: Vec<String> = tool
        .response_columns()
        .iter()
        .map(|c| format!("r.{c}"))
        .collect();
    let filter = match therapist {
        Some(_) => "WHERE c.therapist = ?",
        None => "",
    };
    let sql = format!(
        "SELECT {cols}, c.therapist, \
         ROW_NUMBER() OVER (PARTITION BY r.client_code ORDER BY r.timestamp) AS session \
         FROM {table} r \
         JOIN clients c ON r.client_code = c.id \
         {filter} \
         ORDER BY r.client_code, r.timestamp",
        cols = select_cols.join(", "),
        table = tool.table_name(),
    );

    let mut query = sqlx::query(&sql);
    if let Some(name) = therapist {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;

    let mut columns: Vec<String> = tool
        .response_columns()
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.push("therapist".to_string());
    columns.push("session".to_string());

    Ok(DataTable {
        rows: rows_to_json(&rows, columns.len()),
        columns,
    })
}

/// Score observations for one tool/column, ranked by session.
///
/// The rank is computed over all of a client's responses before rows with
/// an absent score are filtered out, so it always matches the table view.
pub async fn score_points(
    pool: &SqlitePool,
    tool: Tool,
    score_column: &str,
    therapist: Option<&str>,
) -> Result<Vec<ScorePoint>> {
    // Column name is interpolated into SQL; only registry-known names pass
    if !tool.score_columns().contains(&score_column) {
        return Err(Error::InvalidInput(format!(
            "Unknown score column '{score_column}' for {tool}"
        )));
    }

    let filter = match therapist {
        Some(_) => "WHERE c.therapist = ?",
        None => "",
    };
    let sql = format!(
        "SELECT client, session, score FROM ( \
           SELECT r.client_code AS client, \
                  CAST(r.{col} AS REAL) AS score, \
                  ROW_NUMBER() OVER (PARTITION BY r.client_code ORDER BY r.timestamp) AS session \
           FROM {table} r \
           JOIN clients c ON r.client_code = c.id \
           {filter} \
         ) WHERE score IS NOT NULL \
         ORDER BY client, session",
        col = score_column,
        table = tool.table_name(),
    );

    let mut query = sqlx::query_as::<_, (String, i64, f64)>(&sql);
    if let Some(name) = therapist {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|(client, session, score)| ScorePoint { client, session, score })
        .collect())
}

/// Per-therapist distinct client counts, overall and per tool.
///
/// LEFT JOINs keep zero-count tools visible; DISTINCT collapses the join
/// fan-out.
pub async fn therapist_counts(pool: &SqlitePool) -> Result<Vec<TherapistCounts>> {
    let rows = sqlx::query_as::<_, (String, i64, i64, i64, i64, i64, i64, i64)>(
        r#"
        SELECT
            c.therapist,
            COUNT(DISTINCT c.id),
            COUNT(DISTINCT epds.client_code),
            COUNT(DISTINCT bdi.client_code),
            COUNT(DISTINCT bai.client_code),
            COUNT(DISTINCT aceq.client_code),
            COUNT(DISTINCT sads.client_code),
            COUNT(DISTINCT asrs.client_code)
        FROM clients c
        LEFT JOIN epds_responses epds ON c.id = epds.client_code
        LEFT JOIN bdi_responses bdi ON c.id = bdi.client_code
        LEFT JOIN bai_responses bai ON c.id = bai.client_code
        LEFT JOIN aceq_responses aceq ON c.id = aceq.client_code
        LEFT JOIN sads_responses sads ON c.id = sads.client_code
        LEFT JOIN asrs_responses asrs ON c.id = asrs.client_code
        WHERE c.therapist <> ''
        GROUP BY c.therapist
        ORDER BY c.therapist
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(therapist, total_clients, epds, bdi, bai, aceq, sads, asrs)| TherapistCounts {
                therapist,
                total_clients,
                epds,
                bdi,
                bai,
                aceq,
                sads,
                asrs,
            },
        )
        .collect())
}

/// Distinct client count, store-wide or for one therapist
pub async fn client_count(pool: &SqlitePool, therapist: Option<&str>) -> Result<i64> {
    let count = match therapist {
        Some(name) => {
            sqlx::query_scalar("SELECT COUNT(DISTINCT id) FROM clients WHERE therapist = ?")
                .bind(name)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(DISTINCT id) FROM clients WHERE therapist <> ''")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

/// Distinct respondents for one tool, store-wide or for one therapist
pub async fn clients_for_tool(
    pool: &SqlitePool,
    tool: Tool,
    therapist: Option<&str>,
) -> Result<i64> {
    let filter = match therapist {
        Some(_) => "WHERE c.therapist = ?",
        None => "WHERE c.therapist <> ''",
    };
    let sql = format!(
        "SELECT COUNT(DISTINCT r.client_code) \
         FROM {table} r \
         JOIN clients c ON r.client_code = c.id \
         {filter}",
        table = tool.table_name(),
    );

    let mut query = sqlx::query_scalar(&sql);
    if let Some(name) = therapist {
        query = query.bind(name);
    }
    Ok(query.fetch_one(pool).await?)
}

/// Non-excluded sheet names from the registry, ordered by name
pub async fn available_tools(pool: &SqlitePool) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        "SELECT sheet_name FROM sheet_config WHERE is_excluded = 0 ORDER BY sheet_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}

/// The full sheet registry, ordered by name
pub async fn sheet_registry(pool: &SqlitePool) -> Result<Vec<SheetConfigEntry>> {
    let rows = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT sheet_name, table_name, is_excluded FROM sheet_config ORDER BY sheet_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(sheet_name, table_name, is_excluded)| SheetConfigEntry {
            sheet_name,
            table_name,
            is_excluded: is_excluded != 0,
        })
        .collect())
}

/// The client roster as a flat table
pub async fn list_clients(pool: &SqlitePool) -> Result<DataTable> {
    let columns = ["id", "therapist", "age", "gender", "client_type", "region"];
    let rows = sqlx::query(
        "SELECT id, therapist, age, gender, client_type, region FROM clients ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(DataTable {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows_to_json(&rows, columns.len()),
    })
}

/// Convert SQLite rows to untyped JSON cells (integer, float, text, null)
fn rows_to_json(rows: &[SqliteRow], width: usize) -> Vec<Vec<Value>> {
    rows.iter()
        .map(|row| (0..width).map(|i| cell_to_json(row, i)).collect())
        .collect()
}

fn cell_to_json(row: &SqliteRow, idx: usize) -> Value {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => Value::Null,
        Ok(_) => {
            if let Ok(v) = row.try_get::<i64, _>(idx) {
                json!(v)
            } else if let Ok(v) = row.try_get::<f64, _>(idx) {
                json!(v)
            } else if let Ok(v) = row.try_get::<String, _>(idx) {
                Value::String(v)
            } else {
                Value::Null
            }
        }
        Err(_) => Value::Null,
    }
}
