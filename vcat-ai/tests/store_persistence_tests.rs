//! File-backed store tests: data written by one process survives a reopen

use chrono::{SubsecRound, Utc};
use tempfile::TempDir;
use vcat_ai::db::Store;
use vcat_ai::models::NewVendorResult;
use vcat_common::{AiCategory, Category};

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

#[tokio::test]
async fn test_history_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("vcat.db");
    let uploaded_at = Utc::now().trunc_subsecs(6);

    let upload_id = {
        let store = Store::open(&db_path).await.unwrap();
        let id = store.create_upload("vendors.csv", uploaded_at).await.unwrap();
        store
            .save_results(
                id,
                &[
                    result(id, "Acme Inc", AiCategory::Assigned(Category::OfficeSupplies)),
                    result(id, "Mystery LLC", AiCategory::Uncategorized),
                ],
            )
            .await
            .unwrap();
        store.pool().close().await;
        id
    };

    let store = Store::open(&db_path).await.unwrap();
    let history = store.list_history().await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].upload.id, upload_id);
    assert_eq!(history[0].upload.uploaded_at, uploaded_at);
    assert_eq!(history[0].results.len(), 2);
    assert_eq!(
        history[0].results[0].ai_category,
        AiCategory::Assigned(Category::OfficeSupplies)
    );
    assert!(history[0].results[1].ai_category.is_uncategorized());
}

#[tokio::test]
async fn test_cache_and_settings_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("vcat.db");

    {
        let store = Store::open(&db_path).await.unwrap();
        store
            .upsert_cached("PowerGrid", Category::Utilities, Some("Electricity"))
            .await
            .unwrap();
        store.set_gemini_api_key("AIza-persisted").await.unwrap();
        store.pool().close().await;
    }

    let store = Store::open(&db_path).await.unwrap();
    assert_eq!(
        store.lookup_cached("powergrid").await.unwrap(),
        Some(Category::Utilities)
    );
    assert_eq!(
        store.get_gemini_api_key().await.unwrap().as_deref(),
        Some("AIza-persisted")
    );
}

#[tokio::test]
async fn test_open_creates_missing_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("vcat.db");

    let store = Store::open(&db_path).await.unwrap();
    store.ping().await.unwrap();

    assert!(db_path.exists());
}
