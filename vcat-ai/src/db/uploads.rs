//! Uploads and their classification results

use super::Store;
use crate::error::StorageError;
use crate::models::{NewVendorResult, Upload, UploadHistory, UploadSummary, VendorResult};
use crate::utils::retry_on_lock;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use vcat_common::{time, AiCategory};

type UploadRow = (i64, String, String);
type ResultRow = (i64, i64, String, Option<String>, Option<String>, String, bool);

fn upload_from_row((id, filename, uploaded_at): UploadRow) -> Result<Upload, StorageError> {
    Ok(Upload {
        id,
        filename,
        uploaded_at: time::from_storage(&uploaded_at)?,
    })
}

fn result_from_row(row: ResultRow) -> Result<VendorResult, StorageError> {
    let (id, upload_id, vendor_name, description, original_category, ai_category, from_cache) = row;
    let ai_category = AiCategory::from_label(&ai_category).ok_or_else(|| {
        StorageError::Corrupt(format!(
            "vendor_results.id {} has unknown category {:?}",
            id, ai_category
        ))
    })?;
    Ok(VendorResult {
        id,
        upload_id,
        vendor_name,
        description,
        original_category,
        ai_category,
        from_cache,
    })
}

const SELECT_RESULTS: &str = "SELECT id, upload_id, vendor_name, description, original_category, ai_category, from_cache FROM vendor_results";

impl Store {
    /// Record a new upload and return its id
    ///
    /// The upload stays out of history until [`Store::save_results`] commits.
    pub async fn create_upload(
        &self,
        filename: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let stamp = time::to_storage(&uploaded_at);
        let id = retry_on_lock("create upload", self.max_lock_wait_ms, || async {
            let done = sqlx::query("INSERT INTO uploads (filename, uploaded_at) VALUES (?, ?)")
                .bind(filename)
                .bind(&stamp)
                .execute(&self.pool)
                .await?;
            Ok(done.last_insert_rowid())
        })
        .await?;

        tracing::debug!(upload_id = id, filename, "Created upload");
        Ok(id)
    }

    /// Persist all results of one upload atomically and mark it complete
    ///
    /// Either every row and the upload itself become visible or nothing
    /// does. An empty `results` slice completes an upload with no vendors.
    /// Fails with `UploadNotFound` when the upload does not exist.
    pub async fn save_results(
        &self,
        upload_id: i64,
        results: &[NewVendorResult],
    ) -> Result<Vec<VendorResult>, StorageError> {
        for result in results {
            if result.upload_id != upload_id {
                return Err(StorageError::InvalidRecord(format!(
                    "result for {:?} belongs to upload {}, not {}",
                    result.vendor_name, result.upload_id, upload_id
                )));
            }
            if result.vendor_name.trim().is_empty() {
                return Err(StorageError::InvalidRecord(
                    "vendor_name must not be empty".to_string(),
                ));
            }
        }

        let saved = retry_on_lock("save results", self.max_lock_wait_ms, || {
            self.save_results_once(upload_id, results)
        })
        .await?;

        tracing::info!(upload_id, rows = saved.len(), "Saved vendor results");
        Ok(saved)
    }

    async fn save_results_once(
        &self,
        upload_id: i64,
        results: &[NewVendorResult],
    ) -> Result<Vec<VendorResult>, StorageError> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query("UPDATE uploads SET completed = 1 WHERE id = ?")
            .bind(upload_id)
            .execute(&mut *tx)
            .await?;
        if marked.rows_affected() == 0 {
            return Err(StorageError::UploadNotFound(upload_id));
        }

        let mut saved = Vec::with_capacity(results.len());
        for result in results {
            let done = sqlx::query(
                r#"
                INSERT INTO vendor_results
                    (upload_id, vendor_name, description, original_category, ai_category, from_cache)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(upload_id)
            .bind(&result.vendor_name)
            .bind(&result.description)
            .bind(&result.original_category)
            .bind(result.ai_category.label())
            .bind(result.from_cache)
            .execute(&mut *tx)
            .await?;

            saved.push(VendorResult {
                id: done.last_insert_rowid(),
                upload_id,
                vendor_name: result.vendor_name.clone(),
                description: result.description.clone(),
                original_category: result.original_category.clone(),
                ai_category: result.ai_category,
                from_cache: result.from_cache,
            });
        }

        tx.commit().await?;
        Ok(saved)
    }

    /// Every completed upload with its results, most recent first
    pub async fn list_history(&self) -> Result<Vec<UploadHistory>, StorageError> {
        let uploads: Vec<UploadRow> = sqlx::query_as(
            "SELECT id, filename, uploaded_at FROM uploads WHERE completed = 1 ORDER BY uploaded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let rows: Vec<ResultRow> = sqlx::query_as(&format!("{} ORDER BY upload_id, id", SELECT_RESULTS))
            .fetch_all(&self.pool)
            .await?;

        let mut by_upload: HashMap<i64, Vec<VendorResult>> = HashMap::new();
        for row in rows {
            let result = result_from_row(row)?;
            by_upload.entry(result.upload_id).or_default().push(result);
        }

        uploads
            .into_iter()
            .map(|row| {
                let upload = upload_from_row(row)?;
                let results = by_upload.remove(&upload.id).unwrap_or_default();
                Ok(UploadHistory { upload, results })
            })
            .collect()
    }

    /// Upload listing with result counts, most recent first
    pub async fn upload_summaries(&self) -> Result<Vec<UploadSummary>, StorageError> {
        let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
            r#"
            SELECT u.id, u.filename, u.uploaded_at, COUNT(r.id)
            FROM uploads u
            LEFT JOIN vendor_results r ON r.upload_id = u.id
            WHERE u.completed = 1
            GROUP BY u.id
            ORDER BY u.uploaded_at DESC, u.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, filename, uploaded_at, vendor_count)| {
                Ok(UploadSummary {
                    id,
                    filename,
                    uploaded_at: time::from_storage(&uploaded_at)?,
                    vendor_count,
                })
            })
            .collect()
    }

    /// One completed upload and its results, `None` when absent or in progress
    pub async fn get_upload(&self, upload_id: i64) -> Result<Option<UploadHistory>, StorageError> {
        let row: Option<UploadRow> =
            sqlx::query_as("SELECT id, filename, uploaded_at FROM uploads WHERE id = ? AND completed = 1")
                .bind(upload_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let upload = upload_from_row(row)?;

        let rows: Vec<ResultRow> =
            sqlx::query_as(&format!("{} WHERE upload_id = ? ORDER BY id", SELECT_RESULTS))
                .bind(upload_id)
                .fetch_all(&self.pool)
                .await?;
        let results = rows
            .into_iter()
            .map(result_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(UploadHistory { upload, results }))
    }

    /// Delete an upload; its results go with it
    ///
    /// Returns false when the upload did not exist.
    pub async fn delete_upload(&self, upload_id: i64) -> Result<bool, StorageError> {
        let done = retry_on_lock("delete upload", self.max_lock_wait_ms, || async {
            Ok(sqlx::query("DELETE FROM uploads WHERE id = ?")
                .bind(upload_id)
                .execute(&self.pool)
                .await?)
        })
        .await?;

        let deleted = done.rows_affected() > 0;
        if deleted {
            tracing::info!(upload_id, "Deleted upload");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vcat_common::Category;

    fn result(upload_id: i64, vendor: &str, category: AiCategory) -> NewVendorResult {
        NewVendorResult {
            upload_id,
            vendor_name: vendor.to_string(),
            description: None,
            original_category: None,
            ai_category: category,
            from_cache: false,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let store = Store::in_memory().await.unwrap();
        let id = store.create_upload("vendors.csv", at(0)).await.unwrap();

        let saved = store
            .save_results(
                id,
                &[
                    result(id, "Acme Inc", Category::OfficeSupplies.into()),
                    result(id, "Mystery", AiCategory::Uncategorized),
                ],
            )
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved[0].id < saved[1].id);

        let detail = store.get_upload(id).await.unwrap().unwrap();
        assert_eq!(detail.upload.filename, "vendors.csv");
        assert_eq!(detail.upload.uploaded_at, at(0));
        assert_eq!(detail.results, saved);
    }

    #[tokio::test]
    async fn test_save_for_unknown_upload_writes_nothing() {
        let store = Store::in_memory().await.unwrap();
        let err = store
            .save_results(42, &[result(42, "Acme", AiCategory::Uncategorized)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadNotFound(42)));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vendor_results")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_mismatched_upload_id_is_rejected() {
        let store = Store::in_memory().await.unwrap();
        let id = store.create_upload("a.csv", at(0)).await.unwrap();
        let err = store
            .save_results(id, &[result(id + 1, "Acme", AiCategory::Uncategorized)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first() {
        let store = Store::in_memory().await.unwrap();
        let older = store.create_upload("old.csv", at(0)).await.unwrap();
        let newer = store.create_upload("new.csv", at(60)).await.unwrap();
        store
            .save_results(older, &[result(older, "A", Category::Marketing.into())])
            .await
            .unwrap();
        store
            .save_results(newer, &[result(newer, "B", Category::Insurance.into())])
            .await
            .unwrap();

        let history = store.list_history().await.unwrap();
        let ids: Vec<_> = history.iter().map(|h| h.upload.id).collect();
        assert_eq!(ids, vec![newer, older]);
        assert_eq!(history[0].results[0].vendor_name, "B");
        assert_eq!(history[1].results[0].vendor_name, "A");
    }

    #[tokio::test]
    async fn test_same_timestamp_orders_by_id() {
        let store = Store::in_memory().await.unwrap();
        let first = store.create_upload("a.csv", at(0)).await.unwrap();
        let second = store.create_upload("b.csv", at(0)).await.unwrap();
        store.save_results(first, &[]).await.unwrap();
        store.save_results(second, &[]).await.unwrap();

        let summaries = store.upload_summaries().await.unwrap();
        assert_eq!(summaries[0].id, second);
        assert_eq!(summaries[1].id, first);
        assert_eq!(summaries[0].vendor_count, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = Store::in_memory().await.unwrap();
        let id = store.create_upload("a.csv", at(0)).await.unwrap();
        store
            .save_results(id, &[result(id, "A", Category::Utilities.into())])
            .await
            .unwrap();

        assert!(store.delete_upload(id).await.unwrap());
        assert!(!store.delete_upload(id).await.unwrap());
        assert!(store.get_upload(id).await.unwrap().is_none());
        assert!(store.list_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_in_progress_is_hidden_until_saved() {
        let store = Store::in_memory().await.unwrap();
        let id = store.create_upload("pending.csv", at(0)).await.unwrap();

        assert!(store.list_history().await.unwrap().is_empty());
        assert!(store.upload_summaries().await.unwrap().is_empty());
        assert!(store.get_upload(id).await.unwrap().is_none());

        store
            .save_results(id, &[result(id, "A", Category::Marketing.into())])
            .await
            .unwrap();

        assert_eq!(store.list_history().await.unwrap().len(), 1);
        assert_eq!(store.upload_summaries().await.unwrap()[0].vendor_count, 1);
        assert!(store.get_upload(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_results_complete_the_upload() {
        let store = Store::in_memory().await.unwrap();
        let id = store.create_upload("header-only.csv", at(0)).await.unwrap();

        assert!(store.save_results(id, &[]).await.unwrap().is_empty());

        let history = store.list_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].upload.id, id);
        assert!(history[0].results.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_upload_hidden() {
        let store = Store::in_memory().await.unwrap();
        let id = store.create_upload("a.csv", at(0)).await.unwrap();

        let err = store
            .save_results(
                id,
                &[
                    result(id, "A", Category::Marketing.into()),
                    result(id, "   ", Category::Marketing.into()),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
        assert!(store.list_history().await.unwrap().is_empty());
    }
}
