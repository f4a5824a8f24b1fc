//! Database pool construction and schema migration.

use anyhow::{Context, Result};
use maktaba_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Connect to Postgres and bring the schema up to date.
///
/// Pool sizing and the acquire timeout come from `Config`. Migrations are
/// applied before the router is built, so no handler ever runs against a
/// stale schema.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to Postgres")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Postgres pool ready"
    );

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply any pending SQL migrations from the workspace `migrations/`
/// directory (resolved relative to this crate).
async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to apply migrations")?;
    tracing::info!("Schema migrations applied");
    Ok(())
}
