//! ctd-ui (Dashboard) - Clinician-facing assessment dashboard
//!
//! Serves per-tool trajectory charts and tables over the assessment store.
//! Runs an initial sync automatically when the store is empty.

use anyhow::Result;
use clap::Parser;
use ctd_common::config::{database_path, ensure_data_dir, load_config, resolve_data_dir};
use ctd_si::sheets::SheetsClient;
use ctd_si::sync::{full_refresh, is_populated};
use ctd_ui::{build_router, AppState};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "ctd-ui", version, about = "CTD assessment dashboard")]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root folder for the SQLite store
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Listen host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config)
    #[arg(long)]
    port: Option<u16>,
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
        "Starting CTD Dashboard (ctd-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let data_dir = resolve_data_dir(args.data_dir.as_deref(), &config);
    ensure_data_dir(&data_dir)?;
    let db_path = database_path(&data_dir);
    info!("Database path: {}", db_path.display());

    let pool = ctd_common::db::init_database(&db_path).await?;

    let (spreadsheet_id, api_key) = config.sheets.credentials()?;
    let sheets = SheetsClient::new(spreadsheet_id, api_key);

    // An unreadable store reads as "not populated" and triggers a fresh sync
    if !is_populated(&pool).await {
        info!("Store is empty; running initial sync");
        match full_refresh(&pool, &sheets).await {
            Ok(summary) => info!(
                "✓ Initial sync {} loaded {} clients and {} responses",
                summary.run_id,
                summary.clients_inserted,
                summary.responses_inserted()
            ),
            Err(e) => warn!("Initial sync failed (dashboard starts empty): {e}"),
        }
    }

    let state = AppState::new(pool, sheets);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ctd-ui listening on http://{addr}");
    info!("Health check: http://{addr}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
