//! vcat-ai library interface
//!
//! Vendor file ingestion, category classification, persistence and the
//! HTTP surface. The binary in `main.rs` wires these together; integration
//! tests build the router directly.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use vcat_common::config::TomlConfig;

use crate::db::Store;
use crate::services::BatchRunner;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Vendor database
    pub store: Store,
    /// Current batch runner; replaced when API keys change
    pub runner: Arc<RwLock<Arc<BatchRunner>>>,
    /// Bootstrap configuration the service started with
    pub toml_config: Arc<TomlConfig>,
    /// TOML file that settings are synced back to, if any
    pub toml_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(store: Store, runner: BatchRunner) -> Self {
        Self {
            store,
            runner: Arc::new(RwLock::new(Arc::new(runner))),
            toml_config: Arc::new(TomlConfig::default()),
            toml_path: None,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_toml(mut self, config: TomlConfig, path: Option<PathBuf>) -> Self {
        self.toml_config = Arc::new(config);
        self.toml_path = path;
        self
    }

    /// Runner for one request; a concurrent reload does not affect it
    pub async fn runner(&self) -> Arc<BatchRunner> {
        self.runner.read().await.clone()
    }

    /// Rebuild the classifier chain from the current settings
    ///
    /// The new runner keeps the previous runner's rate limiter.
    pub async fn reload_classifier(&self) -> anyhow::Result<String> {
        let chain = config::build_classifier(&self.store, &self.toml_config).await?;
        let runner = self.runner().await.with_classifier(Arc::new(chain));
        let name = runner.classifier_name().to_string();
        *self.runner.write().await = Arc::new(runner);
        Ok(name)
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.toml_config.server.max_upload_bytes;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::upload_routes())
        .merge(api::history_routes())
        .merge(api::category_routes())
        .merge(api::cache_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
