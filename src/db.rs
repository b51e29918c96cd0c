//! PostGIS connection pool

use crate::config::AtlasConfig;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Create the PostGIS connection pool.
///
/// Every session gets a server-side `statement_timeout`; the pool caps how
/// long a request may wait for a free connection.
pub async fn create_pool(config: &AtlasConfig) -> anyhow::Result<PgPool> {
    let statement_timeout = format!("{}ms", config.statement_timeout.as_millis());
    let options = config
        .database
        .connect_options()?
        .application_name("basin-atlas")
        .options([("statement_timeout", statement_timeout.as_str())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .context("connecting to PostGIS")?;

    info!(
        max_connections = config.max_connections,
        statement_timeout = %statement_timeout,
        "Connected to PostGIS"
    );
    Ok(pool)
}

/// Drain and close every pooled connection.
pub async fn close_pool(pool: &PgPool) {
    pool.close().await;
    info!("PostGIS pool closed");
}
