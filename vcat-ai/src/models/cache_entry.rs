//! Vendor category cache entry

use chrono::{DateTime, Utc};
use serde::Serialize;
use vcat_common::Category;

/// Last known category for a vendor name (matched case-insensitively)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedCategory {
    pub id: i64,
    pub vendor_name: String,
    pub category: Category,
    pub description: Option<String>,
    pub last_updated: DateTime<Utc>,
}
