//! Data models for vendor uploads and classification results

pub mod cache_entry;
pub mod upload;
pub mod vendor_row;

pub use cache_entry::CachedCategory;
pub use upload::{NewVendorResult, Upload, UploadHistory, UploadSummary, VendorResult};
pub use vendor_row::VendorRow;
