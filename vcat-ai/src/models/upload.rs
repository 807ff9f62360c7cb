//! Upload and per-vendor result records

use chrono::{DateTime, Utc};
use serde::Serialize;
use vcat_common::AiCategory;

/// One accepted file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Classification result as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorResult {
    pub id: i64,
    pub upload_id: i64,
    pub vendor_name: String,
    pub description: Option<String>,
    pub original_category: Option<String>,
    pub ai_category: AiCategory,
    pub from_cache: bool,
}

/// Classification result waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVendorResult {
    pub upload_id: i64,
    pub vendor_name: String,
    pub description: Option<String>,
    pub original_category: Option<String>,
    pub ai_category: AiCategory,
    pub from_cache: bool,
}

/// Upload with all of its results, in insertion order
#[derive(Debug, Clone, Serialize)]
pub struct UploadHistory {
    #[serde(flatten)]
    pub upload: Upload,
    pub results: Vec<VendorResult>,
}

/// Upload listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub vendor_count: i64,
}
