//! One parsed row of an uploaded vendor file

use serde::Serialize;

/// Vendor record produced by the CSV ingestor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorRow {
    /// 1-based line in the source file (header is line 1)
    pub line: u64,
    pub vendor_name: String,
    pub description: Option<String>,
    pub original_category: Option<String>,
}

impl VendorRow {
    pub fn new(vendor_name: impl Into<String>) -> Self {
        Self {
            line: 0,
            vendor_name: vendor_name.into(),
            description: None,
            original_category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Description text handed to a classifier; empty when absent
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
