use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = connect_url(&config.connection_url(), config.max_connections).await?;
    info!(host = %config.host, database = %config.name, "connected to PostgreSQL");
    Ok(pool)
}

pub async fn connect_url(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await
        .context("connect to database")
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")?;
    info!("migrations completed");
    Ok(())
}

/// Migrations are best effort: the table may be owned by an external schema tool.
pub async fn migrate_or_warn(pool: &PgPool) {
    if let Err(e) = run_migrations(pool).await {
        warn!(error = ?e, "migration failed; continuing with existing schema");
    }
}
