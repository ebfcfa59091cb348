//! Database initialization
//!
//! Creates the store on first run and opens it on subsequent runs. Schema
//! creation is idempotent; every service calls this at startup.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows the dashboard to read while a sync transaction is open
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Create all seven tables (idempotent)
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    create_clients_table(pool).await?;
    create_epds_responses_table(pool).await?;
    create_bdi_responses_table(pool).await?;
    create_bai_responses_table(pool).await?;
    create_aceq_responses_table(pool).await?;
    create_sads_responses_table(pool).await?;
    create_asrs_responses_table(pool).await?;
    create_sheet_config_table(pool).await?;
    Ok(())
}

async fn create_clients_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY,
            therapist TEXT NOT NULL,
            age INTEGER,
            gender TEXT,
            client_type TEXT,
            region TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_epds_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS epds_responses (
            timestamp TEXT,
            client_code TEXT NOT NULL,
            total_score INTEGER,
            severity_descriptor TEXT,
            item_10_raw_score INTEGER,
            suicidality_flag TEXT,
            notes TEXT,
            FOREIGN KEY (client_code) REFERENCES clients (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bdi_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bdi_responses (
            timestamp TEXT,
            client_code TEXT NOT NULL,
            total_score INTEGER,
            severity_level TEXT,
            clinical_interpretation TEXT,
            FOREIGN KEY (client_code) REFERENCES clients (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bai_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bai_responses (
            timestamp TEXT,
            client_code TEXT NOT NULL,
            total_score INTEGER,
            severity TEXT,
            clinical_conclusion TEXT,
            FOREIGN KEY (client_code) REFERENCES clients (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_aceq_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS aceq_responses (
            timestamp TEXT,
            client_code TEXT NOT NULL,
            total_score INTEGER,
            FOREIGN KEY (client_code) REFERENCES clients (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sads_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sads_responses (
            timestamp TEXT,
            client_code TEXT NOT NULL,
            social_avoidance_score INTEGER,
            social_avoidance_level TEXT,
            social_distress_score INTEGER,
            social_distress_level TEXT,
            total_score INTEGER,
            overall_level TEXT,
            FOREIGN KEY (client_code) REFERENCES clients (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_asrs_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS asrs_responses (
            timestamp TEXT,
            client_code TEXT NOT NULL,
            part_a_score INTEGER,
            part_a_descriptor TEXT,
            part_b_score INTEGER,
            part_b_descriptor TEXT,
            total_score INTEGER,
            total_descriptor TEXT,
            inattentive_raw INTEGER,
            inattentive_percent REAL,
            hyperactivity_motor_raw INTEGER,
            hyperactivity_motor_percent REAL,
            hyperactivity_verbal_raw INTEGER,
            hyperactivity_verbal_percent REAL,
            FOREIGN KEY (client_code) REFERENCES clients (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sheet_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sheet_config (
            sheet_name TEXT PRIMARY KEY,
            table_name TEXT,
            is_excluded INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
