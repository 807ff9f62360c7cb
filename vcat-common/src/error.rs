//! Common error types for VCAT

use thiserror::Error;

/// Common result type for VCAT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping a service: configuration, filesystem
/// and database initialization.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
