//! Upload endpoint
//!
//! POST /upload takes a multipart form with a `file` field, classifies every
//! vendor row and persists the results under a new upload.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum::body::Bytes;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::models::VendorResult;
use crate::services::{ingest, BatchStats};
use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "file";

/// Response for a processed upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub stats: BatchStats,
    pub results: Vec<VendorResult>,
}

fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(format!("{}: {}", context, err.body_text()))
    }
}

async fn read_file_field(multipart: &mut Multipart) -> ApiResult<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read upload", e))?;
        return Ok((filename, data));
    }

    Err(ValidationError::MissingFile.into())
}

/// POST /upload
///
/// **Errors:**
/// - 413 `PAYLOAD_TOO_LARGE`: body over `server.max_upload_bytes`
/// - 400: no file, unsupported extension, missing `vendor_name` column,
///   unparseable content. Nothing is written and no classifier call is made.
/// - 500 `SAVE_FAILED`: results could not be persisted; the upload row is
///   removed again.
///
/// A header-only file is accepted and produces an upload with no results.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let (filename, data) = read_file_field(&mut multipart).await?;
    let rows = ingest(&filename, &data)?;

    let uploaded_at = Utc::now().trunc_subsecs(6);
    let upload_id = state.store.create_upload(&filename, uploaded_at).await?;
    info!(upload_id, filename = %filename, rows = rows.len(), "Accepted upload");

    let runner = state.runner().await;
    let outcome = runner.run(upload_id, &rows).await;

    let results = match state.store.save_results(upload_id, &outcome.results).await {
        Ok(saved) => saved,
        Err(err) => {
            if let Err(cleanup) = state.store.delete_upload(upload_id).await {
                warn!(upload_id, error = %cleanup, "Failed to remove upload after save failure");
            }
            state
                .record_error(format!("Saving upload {} failed: {}", upload_id, err))
                .await;
            return Err(ApiError::SaveFailed(err));
        }
    };

    Ok(Json(UploadResponse {
        upload_id,
        filename,
        uploaded_at,
        stats: outcome.stats,
        results,
    }))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_file))
}
