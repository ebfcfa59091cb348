//! Sync/load routine
//!
//! Fully replaces the store contents from a fetched workbook. The whole
//! replace runs inside one transaction: readers keep the previous contents
//! until commit, and a failed refresh rolls back instead of leaving a
//! partially-emptied store.
//!
//! Load order is load-bearing: clients go in before responses so response
//! rows can be checked against the inserted id set. Rows referencing an
//! unknown client are dropped, counted, and logged, never inserted.

use crate::sheets::{SheetSet, SheetsClient};
use ctd_common::coerce::{parse_int, parse_percentage, parse_string, parse_timestamp};
use ctd_common::db::models::{
    AceqResponse, AsrsResponse, BaiResponse, BdiResponse, Client, EpdsResponse, SadsResponse,
    SyncSummary, ToolLoadStats,
};
use ctd_common::tools::{table_for_sheet, Tool, CLIENTS_SHEET, EXCLUDED_SHEETS};
use ctd_common::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Fetch every tab from the source and run a full sync
pub async fn full_refresh(pool: &SqlitePool, sheets: &SheetsClient) -> Result<SyncSummary> {
    let source = sheets.fetch_all().await?;
    run_sync(pool, &source).await
}

/// Replace the store contents with the given workbook snapshot
pub async fn run_sync(pool: &SqlitePool, source: &SheetSet) -> Result<SyncSummary> {
    let started = Instant::now();
    let run_id = Uuid::new_v4();
    info!(
        "Sync {run_id}: replacing store contents from {} sheets",
        source.len()
    );

    let mut tx = pool.begin().await?;

    clear_store(&mut tx).await?;
    let sheets_registered = rebuild_registry(&mut tx, source).await?;
    let (clients_inserted, clients_skipped, known) = load_clients(&mut tx, source).await?;

    let mut tools = Vec::with_capacity(Tool::ALL.len());
    for tool in Tool::ALL {
        let stats = match tool {
            Tool::Epds => load_epds(&mut tx, source, &known).await?,
            Tool::Bdi => load_bdi(&mut tx, source, &known).await?,
            Tool::Bai => load_bai(&mut tx, source, &known).await?,
            Tool::AceQ => load_aceq(&mut tx, source, &known).await?,
            Tool::Sads => load_sads(&mut tx, source, &known).await?,
            Tool::Asrs => load_asrs(&mut tx, source, &known).await?,
        };
        if stats.orphans_dropped > 0 {
            warn!(
                "Sync {run_id}: dropped {} {} rows referencing unknown clients",
                stats.orphans_dropped, tool
            );
        }
        tools.push(stats);
    }

    tx.commit().await?;

    let summary = SyncSummary {
        run_id,
        sheets_registered,
        clients_inserted,
        clients_skipped,
        tools,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Sync {run_id}: {} clients, {} responses, {} orphans dropped, {} sheets registered in {} ms",
        summary.clients_inserted,
        summary.responses_inserted(),
        summary.orphans_dropped(),
        summary.sheets_registered,
        summary.elapsed_ms
    );
    Ok(summary)
}

/// Store-populated check; any database failure reads as "not populated"
/// and so triggers a fresh sync
pub async fn is_populated(pool: &SqlitePool) -> bool {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count > 0,
        Err(_) => false,
    }
}

/// Delete all rows from every table; responses first, clients last
async fn clear_store(tx: &mut Transaction<'_, Sqlite>) -> Result<()> {
    for tool in Tool::ALL {
        sqlx::query(&format!("DELETE FROM {}", tool.table_name()))
            .execute(&mut **tx)
            .await?;
    }
    sqlx::query("DELETE FROM sheet_config").execute(&mut **tx).await?;
    sqlx::query("DELETE FROM clients").execute(&mut **tx).await?;
    Ok(())
}

/// Register every source tab; the exclusion list hides roster and link
/// sheets from the "available tools" listing
async fn rebuild_registry(tx: &mut Transaction<'_, Sqlite>, source: &SheetSet) -> Result<usize> {
    for (sheet_name, _) in source.iter() {
        let is_excluded = EXCLUDED_SHEETS.contains(&sheet_name);
        let table_name = table_for_sheet(sheet_name).unwrap_or("");
        sqlx::query(
            "INSERT OR REPLACE INTO sheet_config (sheet_name, table_name, is_excluded) \
             VALUES (?, ?, ?)",
        )
        .bind(sheet_name)
        .bind(table_name)
        .bind(is_excluded as i64)
        .execute(&mut **tx)
        .await?;
    }
    Ok(source.len())
}

/// Insert the client roster; rows missing an id or therapist assignment are
/// skipped. Returns the set of inserted ids for the response-row check.
async fn load_clients(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
) -> Result<(u64, u64, HashSet<String>)> {
    let mut inserted = 0u64;
    let mut skipped = 0u64;
    let mut known = HashSet::new();

    let Some(tab) = source.get(CLIENTS_SHEET) else {
        warn!("Source has no '{CLIENTS_SHEET}' sheet; store will have no clients");
        return Ok((0, 0, known));
    };

    for row in tab.rows() {
        // Header names are verbatim from the source workbook, stray
        // backtick included
        let id = parse_string(row.get("ID"));
        let therapist = parse_string(row.get("Counsellor Assn`"));
        if id.is_empty() || therapist.is_empty() {
            skipped += 1;
            continue;
        }

        let client = Client {
            id: id.clone(),
            therapist,
            age: parse_int(row.get("Age")),
            gender: parse_string(row.get("Gender")),
            client_type: parse_string(row.get("Client Type")),
            region: parse_string(row.get("county")),
        };
        insert_client(tx, &client).await?;
        known.insert(id);
        inserted += 1;
    }

    if skipped > 0 {
        warn!("Dropped {skipped} roster rows missing an id or therapist assignment");
    }
    Ok((inserted, skipped, known))
}

async fn insert_client(tx: &mut Transaction<'_, Sqlite>, client: &Client) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO clients (id, therapist, age, gender, client_type, region) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&client.id)
    .bind(&client.therapist)
    .bind(client.age)
    .bind(&client.gender)
    .bind(&client.client_type)
    .bind(&client.region)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn load_epds(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
    known: &HashSet<String>,
) -> Result<ToolLoadStats> {
    let mut stats = new_stats(Tool::Epds);
    let Some(tab) = source.get(Tool::Epds.sheet_name()) else {
        return Ok(stats);
    };

    for row in tab.rows() {
        let client_code = parse_string(row.get("Client Code"));
        if !known.contains(&client_code) {
            stats.orphans_dropped += 1;
            continue;
        }

        let response = EpdsResponse {
            timestamp: parse_timestamp(row.get("Timestamp")),
            client_code,
            total_score: parse_int(row.get("EPDS Total Score (Max 30)")),
            severity_descriptor: parse_string(row.get("Severity Descriptor")),
            item_10_raw_score: parse_int(row.get("Item 10 (Harming Self) Raw Score")),
            suicidality_flag: parse_string(row.get("Suicidality Flag (Clinical Alert)")),
            notes: parse_string(row.get("Column 1")),
        };
        sqlx::query(
            "INSERT INTO epds_responses \
             (timestamp, client_code, total_score, severity_descriptor, \
              item_10_raw_score, suicidality_flag, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&response.timestamp)
        .bind(&response.client_code)
        .bind(response.total_score)
        .bind(&response.severity_descriptor)
        .bind(response.item_10_raw_score)
        .bind(&response.suicidality_flag)
        .bind(&response.notes)
        .execute(&mut **tx)
        .await?;
        stats.inserted += 1;
    }
    Ok(stats)
}

async fn load_bdi(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
    known: &HashSet<String>,
) -> Result<ToolLoadStats> {
    let mut stats = new_stats(Tool::Bdi);
    let Some(tab) = source.get(Tool::Bdi.sheet_name()) else {
        return Ok(stats);
    };

    for row in tab.rows() {
        let client_code = parse_string(row.get("Client Code"));
        if !known.contains(&client_code) {
            stats.orphans_dropped += 1;
            continue;
        }

        let response = BdiResponse {
            timestamp: parse_timestamp(row.get("Timestamp")),
            client_code,
            total_score: parse_int(row.get("BDI Total")),
            severity_level: parse_string(row.get("Severity Level")),
            clinical_interpretation: parse_string(row.get("Clinical Interpretation")),
        };
        sqlx::query(
            "INSERT INTO bdi_responses \
             (timestamp, client_code, total_score, severity_level, clinical_interpretation) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&response.timestamp)
        .bind(&response.client_code)
        .bind(response.total_score)
        .bind(&response.severity_level)
        .bind(&response.clinical_interpretation)
        .execute(&mut **tx)
        .await?;
        stats.inserted += 1;
    }
    Ok(stats)
}

async fn load_bai(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
    known: &HashSet<String>,
) -> Result<ToolLoadStats> {
    let mut stats = new_stats(Tool::Bai);
    let Some(tab) = source.get(Tool::Bai.sheet_name()) else {
        return Ok(stats);
    };

    for row in tab.rows() {
        let client_code = parse_string(row.get("Client Code"));
        if !known.contains(&client_code) {
            stats.orphans_dropped += 1;
            continue;
        }

        let response = BaiResponse {
            timestamp: parse_timestamp(row.get("Timestamp")),
            client_code,
            total_score: parse_int(row.get("Total Score")),
            severity: parse_string(row.get("Severity")),
            // Header carries a trailing space in the source workbook
            clinical_conclusion: parse_string(row.get("Clinical Conclusion ")),
        };
        sqlx::query(
            "INSERT INTO bai_responses \
             (timestamp, client_code, total_score, severity, clinical_conclusion) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&response.timestamp)
        .bind(&response.client_code)
        .bind(response.total_score)
        .bind(&response.severity)
        .bind(&response.clinical_conclusion)
        .execute(&mut **tx)
        .await?;
        stats.inserted += 1;
    }
    Ok(stats)
}

async fn load_aceq(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
    known: &HashSet<String>,
) -> Result<ToolLoadStats> {
    let mut stats = new_stats(Tool::AceQ);
    let Some(tab) = source.get(Tool::AceQ.sheet_name()) else {
        return Ok(stats);
    };

    for row in tab.rows() {
        let client_code = parse_string(row.get("Client Code"));
        if !known.contains(&client_code) {
            stats.orphans_dropped += 1;
            continue;
        }

        let response = AceqResponse {
            timestamp: parse_timestamp(row.get("Timestamp")),
            client_code,
            total_score: parse_int(row.get("Total ACE Score")),
        };
        sqlx::query(
            "INSERT INTO aceq_responses (timestamp, client_code, total_score) VALUES (?, ?, ?)",
        )
        .bind(&response.timestamp)
        .bind(&response.client_code)
        .bind(response.total_score)
        .execute(&mut **tx)
        .await?;
        stats.inserted += 1;
    }
    Ok(stats)
}

async fn load_sads(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
    known: &HashSet<String>,
) -> Result<ToolLoadStats> {
    let mut stats = new_stats(Tool::Sads);
    let Some(tab) = source.get(Tool::Sads.sheet_name()) else {
        return Ok(stats);
    };

    for row in tab.rows() {
        let client_code = parse_string(row.get("Client Code"));
        if !known.contains(&client_code) {
            stats.orphans_dropped += 1;
            continue;
        }

        let response = SadsResponse {
            timestamp: parse_timestamp(row.get("Timestamp")),
            client_code,
            social_avoidance_score: parse_int(row.get("Social Avoidance Score")),
            social_avoidance_level: parse_string(row.get("Social Avoidance Level")),
            social_distress_score: parse_int(row.get("Social Distress Score")),
            social_distress_level: parse_string(row.get("Social Distress Level")),
            total_score: parse_int(row.get("Total SADS Score")),
            overall_level: parse_string(row.get("Overall Level")),
        };
        sqlx::query(
            "INSERT INTO sads_responses \
             (timestamp, client_code, social_avoidance_score, social_avoidance_level, \
              social_distress_score, social_distress_level, total_score, overall_level) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&response.timestamp)
        .bind(&response.client_code)
        .bind(response.social_avoidance_score)
        .bind(&response.social_avoidance_level)
        .bind(response.social_distress_score)
        .bind(&response.social_distress_level)
        .bind(response.total_score)
        .bind(&response.overall_level)
        .execute(&mut **tx)
        .await?;
        stats.inserted += 1;
    }
    Ok(stats)
}

async fn load_asrs(
    tx: &mut Transaction<'_, Sqlite>,
    source: &SheetSet,
    known: &HashSet<String>,
) -> Result<ToolLoadStats> {
    let mut stats = new_stats(Tool::Asrs);
    let Some(tab) = source.get(Tool::Asrs.sheet_name()) else {
        return Ok(stats);
    };

    for row in tab.rows() {
        let client_code = parse_string(row.get("Client Code"));
        if !known.contains(&client_code) {
            stats.orphans_dropped += 1;
            continue;
        }

        let response = AsrsResponse {
            timestamp: parse_timestamp(row.get("Timestamp")),
            client_code,
            part_a_score: parse_int(row.get("Part A Score")),
            part_a_descriptor: parse_string(row.get("Part A Descriptor")),
            part_b_score: parse_int(row.get("Part B Score")),
            part_b_descriptor: parse_string(row.get("Part B Descriptor")),
            total_score: parse_int(row.get("Total Score")),
            total_descriptor: parse_string(row.get("Total Descriptor")),
            inattentive_raw: parse_int(row.get("Inattentive Subscale (Raw)")),
            inattentive_percent: parse_percentage(row.get("Inattentive Subscale (%)")),
            hyperactivity_motor_raw: parse_int(row.get("Hyperactivity-Motor Subscale (Raw)")),
            hyperactivity_motor_percent: parse_percentage(
                row.get("Hyperactivity-Motor Subscale (%)"),
            ),
            hyperactivity_verbal_raw: parse_int(row.get("Hyperactivity-Verbal Subscale (Raw)")),
            hyperactivity_verbal_percent: parse_percentage(
                row.get("Hyperactivity-Verbal Subscale (%)"),
            ),
        };
        sqlx::query(
            "INSERT INTO asrs_responses \
             (timestamp, client_code, part_a_score, part_a_descriptor, part_b_score, \
              part_b_descriptor, total_score, total_descriptor, inattentive_raw, \
              inattentive_percent, hyperactivity_motor_raw, hyperactivity_motor_percent, \
              hyperactivity_verbal_raw, hyperactivity_verbal_percent) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&response.timestamp)
        .bind(&response.client_code)
        .bind(response.part_a_score)
        .bind(&response.part_a_descriptor)
        .bind(response.part_b_score)
        .bind(&response.part_b_descriptor)
        .bind(response.total_score)
        .bind(&response.total_descriptor)
        .bind(response.inattentive_raw)
        .bind(response.inattentive_percent)
        .bind(response.hyperactivity_motor_raw)
        .bind(response.hyperactivity_motor_percent)
        .bind(response.hyperactivity_verbal_raw)
        .bind(response.hyperactivity_verbal_percent)
        .execute(&mut **tx)
        .await?;
        stats.inserted += 1;
    }
    Ok(stats)
}

fn new_stats(tool: Tool) -> ToolLoadStats {
    ToolLoadStats {
        tool,
        inserted: 0,
        orphans_dropped: 0,
    }
}
