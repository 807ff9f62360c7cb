//! Database initialization shared by VCAT services

pub mod init;

pub use init::{create_schema, init_database, init_in_memory, SCHEMA_VERSION};
