//! Pool construction, database bootstrap, and migrations.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Embedded migrations, compiled in from the `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Open a connection pool against the configured database.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;
    Ok(pool)
}

/// Open a pool that connects on first use instead of up front.
///
/// Used by the HTTP server: a store that is down shows up as per-request
/// errors (and in the diagnostics endpoint) rather than a failed startup.
pub fn create_lazy_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&config.database_url)
        .with_context(|| format!("invalid database URL {}", config.database_url))?;
    Ok(pool)
}

/// Apply any pending embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!("migrations applied");
    Ok(())
}

/// Create the configured database if it does not exist yet.
///
/// Connects to the `postgres` maintenance database on the same server, since
/// the target database cannot be created from a connection to itself.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let db_name = config.database_name();
    // CREATE DATABASE cannot take a bind parameter, so the name is spliced
    // into the statement. Refuse anything that is not a plain identifier.
    if db_name.is_empty()
        || !db_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        bail!("invalid database name {db_name:?}");
    }

    let maintenance = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.maintenance_url())
        .await
        .with_context(|| format!("failed to connect to {}", config.maintenance_url()))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maintenance)
            .await
            .context("failed to check for existing database")?;

    if !exists {
        maintenance
            .execute(format!("CREATE DATABASE \"{db_name}\"").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(database = db_name, "created database");
    }

    maintenance.close().await;
    Ok(())
}

/// Round-trip a trivial query to confirm the store answers at all.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("store did not answer")?;
    Ok(())
}

/// Name and row count of every user table, for status output after setup.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
    )
    .fetch_all(pool)
    .await
    .context("failed to list tables")?;

    let mut counts = Vec::with_capacity(tables.len());
    for (table,) in tables {
        if table.starts_with("_sqlx") {
            continue;
        }
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{table}\""))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}
