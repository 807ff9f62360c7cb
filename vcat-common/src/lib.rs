//! # VCAT Common Library
//!
//! Shared code for the vendor categorization services:
//! - Error type for bootstrap and database initialization
//! - TOML bootstrap configuration and root folder resolution
//! - The closed vendor category set
//! - SQLite database initialization and schema
//! - Timestamp helpers

pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use categories::{AiCategory, Category, UNCATEGORIZED};
pub use error::{Error, Result};
