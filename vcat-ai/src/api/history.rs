//! History endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::StorageError;
use crate::models::{UploadHistory, UploadSummary};
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct DeleteUploadResponse {
    pub upload_id: i64,
    pub deleted: bool,
}

/// GET /history
///
/// Every upload with its results, most recent first.
pub async fn list_history(State(state): State<AppState>) -> ApiResult<Json<Vec<UploadHistory>>> {
    Ok(Json(state.store.list_history().await?))
}

/// GET /history/summary
pub async fn list_summaries(State(state): State<AppState>) -> ApiResult<Json<Vec<UploadSummary>>> {
    Ok(Json(state.store.upload_summaries().await?))
}

/// GET /history/:upload_id
pub async fn get_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<i64>,
) -> ApiResult<Json<UploadHistory>> {
    state
        .store
        .get_upload(upload_id)
        .await?
        .map(Json)
        .ok_or_else(|| StorageError::UploadNotFound(upload_id).into())
}

/// DELETE /history/:upload_id
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<i64>,
) -> ApiResult<Json<DeleteUploadResponse>> {
    if !state.store.delete_upload(upload_id).await? {
        return Err(StorageError::UploadNotFound(upload_id).into());
    }
    Ok(Json(DeleteUploadResponse {
        upload_id,
        deleted: true,
    }))
}

/// Build history routes
pub fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/summary", get(list_summaries))
        .route("/history/:upload_id", get(get_upload).delete(delete_upload))
}
