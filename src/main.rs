//! Basin Atlas — GeoJSON map layer server
//!
//! ## Environment variables
//!
//! | Variable                       | Required | Description                               |
//! |--------------------------------|----------|-------------------------------------------|
//! | `DATABASE_URL`                 | One of   | PostgreSQL connection string              |
//! | `DB_HOST` `DB_NAME` `DB_USER`  | One of   | Discrete connection settings              |
//! | `DB_PWD` / `DB_PORT`           | No       | Password / port (default 5432)            |
//! | `ATLAS_DATA_DIR`               | No       | Snapshot directory (default `.`)          |
//! | `ATLAS_CORS_ORIGINS`           | No       | Comma-separated origins (default any)     |
//! | `ATLAS_STATEMENT_TIMEOUT_SECS` | No       | Per-statement timeout (default 30)        |

use basin_atlas::api::{self, AppState};
use basin_atlas::config::{AtlasConfig, CliOverrides};
use basin_atlas::db;
use basin_atlas::geojson::PgFeatureSource;
use basin_atlas::static_files::StaticStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "basin-atlas", about = "Basin Atlas — TRS section and well GeoJSON server")]
struct CliArgs {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Port to listen on (default: 5000)
    #[arg(long, short)]
    port: Option<u16>,

    /// Bind address (overrides --port)
    #[arg(long)]
    bind_address: Option<String>,

    /// Directory containing wells.geojson, tr_json.json and rigs.csv
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,basin_atlas=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let config = AtlasConfig::from_env(CliOverrides {
        database_url: args.database_url,
        bind_address: args.bind_address,
        port: args.port,
        data_dir: args.data_dir,
    })?;

    info!(
        bind = %config.bind_address,
        data_dir = %config.data_dir.display(),
        "Starting Basin Atlas"
    );

    // ── Database ──────────────────────────────────────────────────────────────
    let pool = db::create_pool(&config).await?;

    // ── HTTP Server ───────────────────────────────────────────────────────────
    let state = AppState {
        features: Arc::new(PgFeatureSource::new(pool.clone())),
        store: StaticStore::new(config.data_dir.clone()),
        max_radius_miles: config.max_radius_miles,
        rig_cutoff_date: config.rig_cutoff_date.clone(),
    };
    let app = api::create_app(state, config.cors_origins.as_deref());
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Basin Atlas listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db::close_pool(&pool).await;
    info!("Basin Atlas shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
