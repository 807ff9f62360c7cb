//! vcat-ai - Vendor categorization service
//!
//! Accepts vendor CSV/TSV uploads, classifies each vendor into a fixed
//! spend category through a generative-AI provider chain and keeps every
//! upload and its results in SQLite for later review.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use vcat_common::config::{
    default_config_path, load_toml_config, RootFolderInitializer, RootFolderResolver, TomlConfig,
};

use vcat_ai::db::Store;
use vcat_ai::services::{BatchRunner, Classifier};
use vcat_ai::{build_router, AppState};

const MODULE_NAME: &str = "vcat-ai";
const STORE_OPEN_ATTEMPTS: u32 = 3;
const STORE_OPEN_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Command-line arguments for vcat-ai
#[derive(Parser, Debug)]
#[command(name = "vcat-ai")]
#[command(about = "Vendor categorization service")]
#[command(version)]
struct Args {
    /// Root folder holding the database (else VCAT_ROOT_FOLDER, TOML, default)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Database file (overrides <root-folder>/vcat.db)
    #[arg(short, long, env = "VCAT_DATABASE")]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "VCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5740
    #[arg(short, long, env = "VCAT_BIND")]
    bind: Option<String>,
}

fn init_tracing(toml_config: &TomlConfig) {
    let default_level = toml_config.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", default_level).into()),
        )
        .init();
}

async fn open_store(db_path: &Path) -> Result<Store> {
    let mut attempt = 1;
    loop {
        match Store::open(db_path).await {
            Ok(store) => return Ok(store),
            Err(e) if attempt < STORE_OPEN_ATTEMPTS => {
                warn!(
                    attempt,
                    error = %e,
                    "Database open failed, retrying in {:?}",
                    STORE_OPEN_RETRY_DELAY
                );
                tokio::time::sleep(STORE_OPEN_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open database {}", db_path.display())
                })
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(MODULE_NAME));
    let toml_config = load_toml_config(&config_path)?;

    init_tracing(&toml_config);

    // Build identification first, before any slow startup step
    info!(
        "Starting vcat-ai v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    if config_path.exists() {
        info!("Configuration: {}", config_path.display());
    } else {
        warn!(
            "Config file not found at {}, using built-in defaults",
            config_path.display()
        );
    }

    let db_path = match args.database.clone().or_else(|| toml_config.database_path.clone()) {
        Some(path) => path,
        None => {
            let root_folder = RootFolderResolver::new(MODULE_NAME)
                .with_cli_arg(args.root_folder.clone())
                .with_toml(&toml_config)
                .resolve();
            let initializer = RootFolderInitializer::new(root_folder);
            initializer
                .ensure_directory_exists()
                .context("Failed to initialize root folder")?;
            initializer.database_path()
        }
    };
    info!("Database: {}", db_path.display());

    let store = open_store(&db_path).await?;
    info!("Database connection established");

    let chain = vcat_ai::config::build_classifier(&store, &toml_config).await?;
    match chain.check_connection().await {
        Ok(status) => info!("Classifier check: {}", status),
        Err(e) => warn!("Classifier check failed: {}", e),
    }

    let settings = vcat_ai::config::batch_settings(&toml_config);
    info!(
        call_interval_ms = settings.call_interval.as_millis() as u64,
        call_timeout_secs = settings.call_timeout.as_secs(),
        use_cache = settings.use_cache,
        "Batch settings"
    );
    let runner = BatchRunner::new(Arc::new(chain), store.clone(), settings);

    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| toml_config.server.bind.clone());
    let state = AppState::new(store, runner).with_toml(toml_config, Some(config_path));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
