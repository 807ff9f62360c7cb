//! Error types for vcat-ai
//!
//! Three failure families flow through an upload request:
//! - [`ValidationError`]: the file is unusable; the request stops before any
//!   classification call or write.
//! - [`ClassificationError`]: one remote call failed; the batch runner turns
//!   it into the `Uncategorized` sentinel for that row.
//! - [`StorageError`]: the database rejected a read or write.
//!
//! [`ApiError`] is the HTTP edge and maps each family onto a status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Rejected upload
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No file selected")]
    MissingFile,

    #[error("File must be a CSV or TSV file: {filename}")]
    UnsupportedFormat { filename: String },

    #[error("File must contain a {column} column")]
    MissingColumn { column: &'static str },

    #[error("File could not be parsed as tabular data (line {line}): {reason}")]
    Malformed { line: u64, reason: String },
}

/// Failure of a single classification attempt
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("{provider}: network error: {message}")]
    Network { provider: String, message: String },

    #[error("classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("{provider}: authentication rejected (HTTP {status})")]
    Auth { provider: String, status: u16 },

    #[error("{provider}: rate limit exceeded")]
    RateLimited { provider: String },

    #[error("{provider}: API error {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider}: malformed response: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("response is not an allowed category: {0:?}")]
    InvalidCategory(String),

    #[error("no keyword matched the vendor")]
    NoMatch,

    #[error("no classifier configured: {0}")]
    NotConfigured(String),
}

/// Persistence failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upload not found: {0}")]
    UploadNotFound(i64),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Database locked after {attempts} attempts ({elapsed_ms} ms elapsed)")]
    Locked { attempts: u32, elapsed_ms: u128 },

    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// True for transient SQLite lock contention worth retrying
    pub fn is_lock_contention(&self) -> bool {
        match self {
            StorageError::Database(err) => {
                let text = err.to_string();
                text.contains("database is locked") || text.contains("database table is locked")
            }
            _ => false,
        }
    }
}

impl From<vcat_common::Error> for StorageError {
    fn from(err: vcat_common::Error) -> Self {
        match err {
            vcat_common::Error::Database(db) => StorageError::Database(db),
            other => StorageError::Corrupt(other.to_string()),
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body over the configured upload limit (413)
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Rejected upload (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Classification finished but results could not be persisted (500)
    #[error("Failed to save results: {0}")]
    SaveFailed(StorageError),

    /// Any other storage failure (500, or 404 for a missing upload)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::SaveFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SAVE_FAILED"),
            ApiError::Storage(StorageError::UploadNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) | ApiError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        } else {
            tracing::warn!(code = error_code, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = ApiError::from(ValidationError::MissingColumn {
            column: "vendor_name",
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_upload_maps_to_not_found() {
        let response = ApiError::from(StorageError::UploadNotFound(7)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_oversized_upload_maps_to_payload_too_large() {
        let response = ApiError::PayloadTooLarge("limit 10 bytes".into()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_save_failure_maps_to_server_error() {
        let response =
            ApiError::SaveFailed(StorageError::InvalidRecord("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_column_message_names_column() {
        let err = ValidationError::MissingColumn {
            column: "vendor_name",
        };
        assert_eq!(err.to_string(), "File must contain a vendor_name column");
    }

    #[test]
    fn test_lock_contention_detection() {
        assert!(!StorageError::UploadNotFound(1).is_lock_contention());
        assert!(!StorageError::Database(sqlx::Error::RowNotFound).is_lock_contention());
    }
}
