//! ctd-si (Sheet Ingest) - One-shot refresh of the assessment store
//!
//! Pulls every tab of the source workbook and replaces the store contents,
//! or reports tab shapes with --dry-run.

use anyhow::Result;
use clap::Parser;
use ctd_common::config::{database_path, ensure_data_dir, load_config, resolve_data_dir};
use ctd_si::sheets::SheetsClient;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ctd-si", version, about = "Refresh the CTD store from the source workbook")]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root folder for the SQLite store
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fetch and report sheet shapes without touching the store
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting CTD Sheet Ingest (ctd-si) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let (spreadsheet_id, api_key) = config.sheets.credentials()?;
    let sheets = SheetsClient::new(spreadsheet_id, api_key);

    if args.dry_run {
        let source = sheets.fetch_all().await?;
        for (name, tab) in source.iter() {
            info!(
                "  '{}': {} rows, {} columns",
                name,
                tab.row_count(),
                tab.columns().len()
            );
        }
        info!("Dry run complete ({} sheets); store untouched", source.len());
        return Ok(());
    }

    let data_dir = resolve_data_dir(args.data_dir.as_deref(), &config);
    ensure_data_dir(&data_dir)?;
    let db_path = database_path(&data_dir);
    info!("Database path: {}", db_path.display());

    let pool = ctd_common::db::init_database(&db_path).await?;

    let summary = ctd_si::sync::full_refresh(&pool, &sheets).await?;

    info!(
        "✓ Sync {} complete: {} clients ({} skipped), {} responses ({} orphans dropped)",
        summary.run_id,
        summary.clients_inserted,
        summary.clients_skipped,
        summary.responses_inserted(),
        summary.orphans_dropped()
    );
    for stats in &summary.tools {
        info!(
            "  {}: {} inserted, {} orphans dropped",
            stats.tool, stats.inserted, stats.orphans_dropped
        );
    }
    for entry in ctd_common::db::queries::sheet_registry(&pool).await? {
        info!(
            "  sheet '{}' -> '{}'{}",
            entry.sheet_name,
            entry.table_name,
            if entry.is_excluded { " (excluded)" } else { "" }
        );
    }

    Ok(())
}
