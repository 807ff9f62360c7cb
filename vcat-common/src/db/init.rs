//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates the schema. Every
//! statement is idempotent, so this runs on each startup.
//!
//! Tables:
//! - `uploads`: one row per accepted file; `completed` once its results are saved
//! - `vendor_results`: one row per classified vendor, cascades with its upload
//! - `vendor_category_cache`: last known category per vendor name
//! - `settings`: key/value runtime settings (API keys entered through the UI)

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 2;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database file, creating it and its parent directory if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// The pool holds exactly one connection that never expires; a second
/// connection would see a different, empty database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_uploads_table(pool).await?;
    create_vendor_results_table(pool).await?;
    create_vendor_category_cache_table(pool).await?;
    create_settings_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, ?)")
        .bind(SCHEMA_VERSION)
        .bind(crate::time::to_storage(&crate::time::now()))
        .execute(pool)
        .await?;

    info!("Database schema ready (version {})", SCHEMA_VERSION);
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_uploads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS uploads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    add_uploads_completed_column(pool).await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_uploads_uploaded_at ON uploads(uploaded_at DESC)")
        .execute(pool)
        .await?;
    Ok(())
}

/// Version 1 databases lack `uploads.completed`
///
/// Rows that already exist were written before the flag existed and are
/// treated as complete.
async fn add_uploads_completed_column(pool: &SqlitePool) -> Result<()> {
    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('uploads') WHERE name = 'completed'",
    )
    .fetch_one(pool)
    .await?;
    if has_column > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    sqlx::query("ALTER TABLE uploads ADD COLUMN completed INTEGER NOT NULL DEFAULT 0")
        .execute(&mut *tx)
        .await?;
    let migrated = sqlx::query("UPDATE uploads SET completed = 1")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    info!("Added uploads.completed column ({} existing uploads marked complete)", migrated);
    Ok(())
}

async fn create_vendor_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vendor_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            upload_id INTEGER NOT NULL REFERENCES uploads(id) ON DELETE CASCADE,
            vendor_name TEXT NOT NULL CHECK (length(trim(vendor_name)) > 0),
            description TEXT,
            original_category TEXT,
            ai_category TEXT NOT NULL,
            from_cache INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vendor_results_upload_id ON vendor_results(upload_id)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_vendor_category_cache_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vendor_category_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            category TEXT NOT NULL,
            description TEXT,
            last_updated TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
