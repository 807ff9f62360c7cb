//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. A missing file
//! is not an error: the service logs a warning and starts with defaults.
//!
//! Root folder priority:
//! 1. Command-line argument
//! 2. `VCAT_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML file
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "VCAT_ROOT_FOLDER";

/// Database file created inside the root folder
pub const DATABASE_FILENAME: &str = "vcat.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file, overrides `<root_folder>/vcat.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:5740`
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Remote classification provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Groq,
    /// Offline keyword matcher
    Keywords,
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Providers tried in order for each vendor
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderKind>,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default)]
    pub groq_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    /// Minimum delay between successive remote calls
    #[serde(default = "default_call_interval_ms")]
    pub call_interval_ms: u64,

    /// Upper bound for one remote call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Consult and fill the vendor category cache
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            gemini_api_key: None,
            groq_api_key: None,
            gemini_model: default_gemini_model(),
            groq_model: default_groq_model(),
            call_interval_ms: default_call_interval_ms(),
            call_timeout_secs: default_call_timeout_secs(),
            use_cache: default_use_cache(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5740".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::Gemini, ProviderKind::Groq]
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_groq_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_call_interval_ms() -> u64 {
    1000
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_use_cache() -> bool {
    true
}

/// Default TOML path for a module: `<config_dir>/vcat/<module>.toml`
pub fn default_config_path(module_name: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vcat")
        .join(format!("{}.toml", module_name))
}

/// Load TOML configuration
///
/// A missing file yields defaults with a warning. An unreadable or invalid
/// file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write TOML configuration through a temporary file and rename
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vcat"))
        .unwrap_or_else(|| PathBuf::from("./vcat_data"))
}

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_value: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(module = %self.module_name, "Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            info!(module = %self.module_name, "Root folder from TOML: {}", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!(module = %self.module_name, "Root folder default: {}", path.display());
        path
    }
}

/// Creates the root folder and names files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILENAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_from_empty_toml() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.root_folder.is_none());
        assert_eq!(config.server.bind, "127.0.0.1:5740");
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.classifier.providers,
            vec![ProviderKind::Gemini, ProviderKind::Groq]
        );
        assert_eq!(config.classifier.call_interval_ms, 1000);
        assert!(config.classifier.use_cache);
    }

    #[test]
    fn test_classifier_section_overrides() {
        let config: TomlConfig = toml::from_str(
            r#"
            [classifier]
            providers = ["groq", "keywords"]
            groq_api_key = "gsk-test"
            call_interval_ms = 250
            use_cache = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.classifier.providers,
            vec![ProviderKind::Groq, ProviderKind::Keywords]
        );
        assert_eq!(config.classifier.groq_api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.classifier.call_interval_ms, 250);
        assert_eq!(config.classifier.call_timeout_secs, 30);
        assert!(!config.classifier.use_cache);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result: std::result::Result<TomlConfig, _> = toml::from_str(
            r#"
            [classifier]
            providers = ["openai"]
            "#,
        );
        assert!(result.is_err());
    }
}
