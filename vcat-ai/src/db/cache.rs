//! Vendor category cache
//!
//! Vendor names are matched case-insensitively (the column is
//! `COLLATE NOCASE`) after trimming.

use super::Store;
use crate::error::StorageError;
use crate::models::CachedCategory;
use crate::utils::retry_on_lock;
use vcat_common::{time, Category};

type CacheRow = (i64, String, String, Option<String>, String);

fn entry_from_row(row: CacheRow) -> Result<CachedCategory, StorageError> {
    let (id, vendor_name, category, description, last_updated) = row;
    let category = Category::from_label(&category).ok_or_else(|| {
        StorageError::Corrupt(format!(
            "vendor_category_cache.id {} has unknown category {:?}",
            id, category
        ))
    })?;
    Ok(CachedCategory {
        id,
        vendor_name,
        category,
        description,
        last_updated: time::from_storage(&last_updated)?,
    })
}

const SELECT_CACHE: &str =
    "SELECT id, vendor_name, category, description, last_updated FROM vendor_category_cache";

impl Store {
    /// Cached category for a vendor name
    pub async fn lookup_cached(&self, vendor_name: &str) -> Result<Option<Category>, StorageError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT category FROM vendor_category_cache WHERE vendor_name = ?")
                .bind(vendor_name.trim())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((label,)) => match Category::from_label(&label) {
                Some(category) => Ok(Some(category)),
                None => {
                    tracing::warn!(vendor = %vendor_name, label = %label, "Ignoring cache entry with unknown category");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Insert or replace the cached category for a vendor
    ///
    /// An absent description keeps the one already stored.
    pub async fn upsert_cached(
        &self,
        vendor_name: &str,
        category: Category,
        description: Option<&str>,
    ) -> Result<CachedCategory, StorageError> {
        let vendor_name = vendor_name.trim();
        if vendor_name.is_empty() {
            return Err(StorageError::InvalidRecord(
                "vendor_name must not be empty".to_string(),
            ));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        let stamp = time::to_storage(&time::now());

        retry_on_lock("upsert cache entry", self.max_lock_wait_ms, || async {
            sqlx::query(
                r#"
                INSERT INTO vendor_category_cache (vendor_name, category, description, last_updated)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(vendor_name) DO UPDATE SET
                    category = excluded.category,
                    description = COALESCE(excluded.description, vendor_category_cache.description),
                    last_updated = excluded.last_updated
                "#,
            )
            .bind(vendor_name)
            .bind(category.label())
            .bind(description)
            .bind(&stamp)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;

        let row: CacheRow = sqlx::query_as(&format!("{} WHERE vendor_name = ?", SELECT_CACHE))
            .bind(vendor_name)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(vendor = %vendor_name, %category, "Cached vendor category");
        entry_from_row(row)
    }

    /// All cache entries ordered by vendor name
    pub async fn list_cached(&self) -> Result<Vec<CachedCategory>, StorageError> {
        let rows: Vec<CacheRow> =
            sqlx::query_as(&format!("{} ORDER BY vendor_name COLLATE NOCASE, id", SELECT_CACHE))
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(entry_from_row).collect()
    }

    /// Remove a cache entry; false when it did not exist
    pub async fn delete_cached(&self, id: i64) -> Result<bool, StorageError> {
        let done = sqlx::query("DELETE FROM vendor_category_cache WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}
