//! Persistence store
//!
//! [`Store`] is an explicitly constructed handle around the SQLite pool. It
//! is cloned into the batch runner and the HTTP state; there is no global
//! connection.

pub mod cache;
pub mod settings;
pub mod uploads;

use crate::error::StorageError;
use crate::utils::DEFAULT_MAX_LOCK_WAIT_MS;
use sqlx::SqlitePool;
use std::path::Path;

/// Handle to the vendor database
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl Store {
    /// Wrap an initialized pool (schema already created)
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    /// Open or create the database file and ensure the schema
    pub async fn open(db_path: &Path) -> Result<Self, StorageError> {
        let pool = vcat_common::db::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database with the full schema
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = vcat_common::db::init_in_memory().await?;
        Ok(Self::new(pool))
    }

    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap connectivity check used by the health endpoint
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
