//! Record store setup

use anyhow::{Context, Result};
use reelvault_core::{Config, RecordStoreBackend};
use reelvault_db::{InMemoryUploadRecordStore, PostgresUploadRecordStore, UploadRecordStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured record store, connecting and migrating when it is PostgreSQL.
pub async fn setup_record_store(config: &Config) -> Result<Arc<dyn UploadRecordStore>> {
    match config.record_store() {
        RecordStoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; upload records are lost on restart");
            Ok(Arc::new(InMemoryUploadRecordStore::new()))
        }
        RecordStoreBackend::Postgres => {
            let pool = setup_database(config).await?;
            Ok(Arc::new(PostgresUploadRecordStore::new(pool)))
        }
    }
}

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url()
        .context("DATABASE_URL must be set when RECORD_STORE=postgres")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    // Workspace migrations/ relative to this crate's root
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
