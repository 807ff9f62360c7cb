//! Runtime configuration for vcat-ai
//!
//! API keys resolve Database → ENV → TOML. Batch tunables resolve
//! ENV → TOML → compiled default.

use crate::db::settings::{GEMINI_API_KEY_SETTING, GROQ_API_KEY_SETTING};
use crate::db::Store;
use crate::error::StorageError;
use crate::services::{
    BatchSettings, Classifier, FallbackClassifier, GeminiClient, GroqClient, KeywordClassifier,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vcat_common::config::{ProviderKind, TomlConfig};
use vcat_common::time::millis_to_duration;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const CALL_INTERVAL_ENV: &str = "VCAT_CALL_INTERVAL_MS";

/// Where a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Database,
    Environment,
    Toml,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeySource::Database => "database",
            KeySource::Environment => "environment",
            KeySource::Toml => "TOML",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    pub source: KeySource,
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn key_names(provider: ProviderKind) -> Option<(&'static str, &'static str)> {
    match provider {
        ProviderKind::Gemini => Some((GEMINI_API_KEY_SETTING, GEMINI_API_KEY_ENV)),
        ProviderKind::Groq => Some((GROQ_API_KEY_SETTING, GROQ_API_KEY_ENV)),
        ProviderKind::Keywords => None,
    }
}

fn toml_key(provider: ProviderKind, toml_config: &TomlConfig) -> Option<&String> {
    match provider {
        ProviderKind::Gemini => toml_config.classifier.gemini_api_key.as_ref(),
        ProviderKind::Groq => toml_config.classifier.groq_api_key.as_ref(),
        ProviderKind::Keywords => None,
    }
}

/// Resolve a provider's API key
///
/// `None` when no tier holds a usable key; the provider is then skipped.
pub async fn resolve_api_key(
    store: &Store,
    toml_config: &TomlConfig,
    provider: ProviderKind,
) -> Result<Option<ResolvedKey>, StorageError> {
    let Some((setting, env_var)) = key_names(provider) else {
        return Ok(None);
    };

    let candidates = [
        (store.get_setting::<String>(setting).await?, KeySource::Database),
        (std::env::var(env_var).ok(), KeySource::Environment),
        (toml_key(provider, toml_config).cloned(), KeySource::Toml),
    ];

    let mut found: Vec<ResolvedKey> = candidates
        .into_iter()
        .filter_map(|(key, source)| {
            key.filter(|k| is_valid_key(k))
                .map(|k| ResolvedKey { key: k.trim().to_string(), source })
        })
        .collect();

    if found.len() > 1 {
        let sources: Vec<String> = found.iter().map(|r| r.source.to_string()).collect();
        warn!(
            ?provider,
            "API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            found[0].source
        );
    }

    if found.is_empty() {
        return Ok(None);
    }
    let resolved = found.remove(0);
    info!(?provider, "API key loaded from {}", resolved.source);
    Ok(Some(resolved))
}

/// Inter-call interval: `VCAT_CALL_INTERVAL_MS` → TOML
pub fn resolve_call_interval(toml_config: &TomlConfig) -> Duration {
    if let Ok(value) = std::env::var(CALL_INTERVAL_ENV) {
        match value.trim().parse::<u64>() {
            Ok(ms) => {
                info!("Call interval from {}: {} ms", CALL_INTERVAL_ENV, ms);
                return millis_to_duration(ms);
            }
            Err(e) => warn!("Ignoring {}={:?}: {}", CALL_INTERVAL_ENV, value, e),
        }
    }
    millis_to_duration(toml_config.classifier.call_interval_ms)
}

/// Batch runner tunables from environment and TOML
pub fn batch_settings(toml_config: &TomlConfig) -> BatchSettings {
    BatchSettings {
        call_interval: resolve_call_interval(toml_config),
        call_timeout: Duration::from_secs(toml_config.classifier.call_timeout_secs),
        use_cache: toml_config.classifier.use_cache,
    }
}

/// Build the provider chain in configured order
///
/// Remote providers without a key are skipped with a warning. An empty
/// chain is allowed: every row then becomes `Uncategorized`.
pub async fn build_classifier(
    store: &Store,
    toml_config: &TomlConfig,
) -> anyhow::Result<FallbackClassifier> {
    let timeout = Duration::from_secs(toml_config.classifier.call_timeout_secs);
    let mut providers: Vec<Arc<dyn Classifier>> = Vec::new();

    for &kind in &toml_config.classifier.providers {
        match kind {
            ProviderKind::Keywords => providers.push(Arc::new(KeywordClassifier::new())),
            ProviderKind::Gemini | ProviderKind::Groq => {
                let Some(resolved) = resolve_api_key(store, toml_config, kind).await? else {
                    warn!(
                        ?kind,
                        "No API key configured, provider disabled. Set it via POST /settings/api-keys, {} or the TOML [classifier] section",
                        key_names(kind).map(|(_, env)| env).unwrap_or_default()
                    );
                    continue;
                };
                let provider: Arc<dyn Classifier> = if kind == ProviderKind::Gemini {
                    Arc::new(GeminiClient::new(
                        resolved.key,
                        toml_config.classifier.gemini_model.clone(),
                        timeout,
                    )?)
                } else {
                    Arc::new(GroqClient::new(
                        resolved.key,
                        toml_config.classifier.groq_model.clone(),
                        timeout,
                    )?)
                };
                providers.push(provider);
            }
        }
    }

    let chain = FallbackClassifier::new(providers).with_call_timeout(timeout);
    if chain.is_empty() {
        warn!("No classification provider available; vendors will be recorded as Uncategorized");
    } else {
        info!(providers = chain.name(), "Classifier chain ready");
    }
    Ok(chain)
}

/// Copy settings into the TOML file (best-effort)
///
/// Keys: `gemini_api_key`, `groq_api_key`. A failed write is logged; the
/// database remains authoritative.
pub fn sync_settings_to_toml(settings: &HashMap<String, String>, toml_path: &Path) {
    let mut config = if toml_path.exists() {
        match vcat_common::config::load_toml_config(toml_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Not syncing settings, existing TOML unreadable: {}", e);
                return;
            }
        }
    } else {
        TomlConfig::default()
    };

    if let Some(key) = settings.get(GEMINI_API_KEY_SETTING) {
        config.classifier.gemini_api_key = Some(key.clone());
    }
    if let Some(key) = settings.get(GROQ_API_KEY_SETTING) {
        config.classifier.groq_api_key = Some(key.clone());
    }

    match vcat_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => info!("Settings synced to TOML: {}", toml_path.display()),
        Err(e) => warn!("TOML write failed (database write succeeded): {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn toml_with_keys(gemini: Option<&str>, groq: Option<&str>) -> TomlConfig {
        let mut config = TomlConfig::default();
        config.classifier.gemini_api_key = gemini.map(str::to_string);
        config.classifier.groq_api_key = groq.map(str::to_string);
        config
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[tokio::test]
    #[serial]
    async fn test_database_key_wins() {
        std::env::set_var(GROQ_API_KEY_ENV, "env-key");
        let store = Store::in_memory().await.unwrap();
        store.set_groq_api_key("db-key").await.unwrap();

        let resolved = resolve_api_key(&store, &toml_with_keys(None, Some("toml-key")), ProviderKind::Groq)
            .await
            .unwrap()
            .unwrap();
        std::env::remove_var(GROQ_API_KEY_ENV);

        assert_eq!(resolved.key, "db-key");
        assert_eq!(resolved.source, KeySource::Database);
    }

    #[tokio::test]
    #[serial]
    async fn test_environment_beats_toml() {
        std::env::set_var(GEMINI_API_KEY_ENV, "env-key");
        let store = Store::in_memory().await.unwrap();

        let resolved = resolve_api_key(&store, &toml_with_keys(Some("toml-key"), None), ProviderKind::Gemini)
            .await
            .unwrap()
            .unwrap();
        std::env::remove_var(GEMINI_API_KEY_ENV);

        assert_eq!(resolved.source, KeySource::Environment);
        assert_eq!(resolved.key, "env-key");
    }

    #[tokio::test]
    #[serial]
    async fn test_blank_keys_are_ignored() {
        std::env::set_var(GEMINI_API_KEY_ENV, "  ");
        let store = Store::in_memory().await.unwrap();

        let resolved = resolve_api_key(&store, &toml_with_keys(Some("toml-key"), None), ProviderKind::Gemini)
            .await
            .unwrap();
        std::env::remove_var(GEMINI_API_KEY_ENV);

        assert_eq!(resolved.map(|r| r.source), Some(KeySource::Toml));
    }

    #[tokio::test]
    #[serial]
    async fn test_no_key_anywhere() {
        std::env::remove_var(GROQ_API_KEY_ENV);
        let store = Store::in_memory().await.unwrap();
        let resolved = resolve_api_key(&store, &TomlConfig::default(), ProviderKind::Groq)
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    #[serial]
    fn test_call_interval_resolution() {
        let mut config = TomlConfig::default();
        config.classifier.call_interval_ms = 250;

        std::env::remove_var(CALL_INTERVAL_ENV);
        assert_eq!(resolve_call_interval(&config), Duration::from_millis(250));

        std::env::set_var(CALL_INTERVAL_ENV, "40");
        assert_eq!(resolve_call_interval(&config), Duration::from_millis(40));

        std::env::set_var(CALL_INTERVAL_ENV, "fast");
        assert_eq!(resolve_call_interval(&config), Duration::from_millis(250));
        std::env::remove_var(CALL_INTERVAL_ENV);
    }

    #[tokio::test]
    #[serial]
    async fn test_build_classifier_skips_providers_without_keys() {
        std::env::remove_var(GEMINI_API_KEY_ENV);
        std::env::remove_var(GROQ_API_KEY_ENV);
        let store = Store::in_memory().await.unwrap();
        let mut config = toml_with_keys(None, Some("gsk-test"));
        config.classifier.providers = vec![ProviderKind::Gemini, ProviderKind::Groq, ProviderKind::Keywords];

        let chain = build_classifier(&store, &config).await.unwrap();
        assert_eq!(chain.name(), "groq+keywords");
    }

    #[test]
    fn test_sync_settings_writes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcat-ai.toml");

        let mut settings = HashMap::new();
        settings.insert(GROQ_API_KEY_SETTING.to_string(), "gsk-sync".to_string());
        sync_settings_to_toml(&settings, &path);

        let config = vcat_common::config::load_toml_config(&path).unwrap();
        assert_eq!(config.classifier.groq_api_key.as_deref(), Some("gsk-sync"));
        assert_eq!(config.classifier.gemini_api_key, None);
    }
}
