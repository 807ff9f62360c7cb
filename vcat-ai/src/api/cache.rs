//! Vendor category cache endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use vcat_common::Category;

use crate::models::CachedCategory;
use crate::{ApiError, ApiResult, AppState};

/// Request payload for adding a cache entry
#[derive(Debug, Deserialize)]
pub struct CacheEntryRequest {
    pub vendor_name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// GET /cache
pub async fn list_cache(State(state): State<AppState>) -> ApiResult<Json<Vec<CachedCategory>>> {
    Ok(Json(state.store.list_cached().await?))
}

/// POST /cache
///
/// **Request:** `{"vendor_name": "...", "category": "...", "description": "..."}`
///
/// **Errors:** 400 when the vendor name is blank or the category is not one
/// of the allowed labels.
pub async fn add_cache_entry(
    State(state): State<AppState>,
    Json(payload): Json<CacheEntryRequest>,
) -> ApiResult<Json<CachedCategory>> {
    if payload.vendor_name.trim().is_empty() {
        return Err(ApiError::BadRequest("vendor_name is required".to_string()));
    }
    let category = Category::from_label(&payload.category).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid category {:?}. Must be one of: {}",
            payload.category,
            Category::labels().join(", ")
        ))
    })?;

    let entry = state
        .store
        .upsert_cached(&payload.vendor_name, category, payload.description.as_deref())
        .await?;

    info!(vendor = %entry.vendor_name, %category, "Vendor cache entry set via API");
    Ok(Json(entry))
}

/// DELETE /cache/:id
pub async fn delete_cache_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete_cached(id).await? {
        return Err(ApiError::NotFound(format!("cache entry {}", id)));
    }
    Ok(Json(serde_json::json!({ "id": id, "deleted": true })))
}

pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/cache", get(list_cache).post(add_cache_entry))
        .route("/cache/:id", delete(delete_cache_entry))
}
