//! Classifier API key settings
//!
//! Keys are written to the database (authoritative), synced to the TOML
//! file when one is known (best-effort), and the classifier chain is rebuilt
//! so the next upload uses them. Keys are never returned.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use vcat_common::config::ProviderKind;

use crate::config::{is_valid_key, resolve_api_key};
use crate::db::settings::{GEMINI_API_KEY_SETTING, GROQ_API_KEY_SETTING};
use crate::{ApiError, ApiResult, AppState};

/// Request payload; at least one key must be present
#[derive(Debug, Deserialize)]
pub struct SetApiKeysRequest {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KeyStatus {
    pub configured: bool,
    /// "database", "environment" or "TOML"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeysStatus {
    pub gemini: KeyStatus,
    pub groq: KeyStatus,
    pub classifier: String,
}

#[derive(Debug, Serialize)]
pub struct SetApiKeysResponse {
    pub success: bool,
    pub message: String,
    pub classifier: String,
}

async fn key_status(state: &AppState, provider: ProviderKind) -> ApiResult<KeyStatus> {
    let resolved = resolve_api_key(&state.store, &state.toml_config, provider).await?;
    Ok(KeyStatus {
        configured: resolved.is_some(),
        source: resolved.map(|r| r.source.to_string()),
    })
}

/// GET /settings/api-keys
pub async fn get_api_keys(State(state): State<AppState>) -> ApiResult<Json<ApiKeysStatus>> {
    Ok(Json(ApiKeysStatus {
        gemini: key_status(&state, ProviderKind::Gemini).await?,
        groq: key_status(&state, ProviderKind::Groq).await?,
        classifier: state.runner().await.classifier_name().to_string(),
    }))
}

/// POST /settings/api-keys
///
/// **Request:** `{"gemini_api_key": "...", "groq_api_key": "..."}`
///
/// **Errors:**
/// - 400: no key given, or a given key is empty/whitespace
/// - 500: database write failure
pub async fn set_api_keys(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeysRequest>,
) -> ApiResult<Json<SetApiKeysResponse>> {
    let mut updates = HashMap::new();
    for (setting, value) in [
        (GEMINI_API_KEY_SETTING, payload.gemini_api_key),
        (GROQ_API_KEY_SETTING, payload.groq_api_key),
    ] {
        if let Some(value) = value {
            if !is_valid_key(&value) {
                return Err(ApiError::BadRequest(format!(
                    "{} cannot be empty or whitespace-only",
                    setting
                )));
            }
            updates.insert(setting.to_string(), value.trim().to_string());
        }
    }

    if updates.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide gemini_api_key and/or groq_api_key".to_string(),
        ));
    }

    for (setting, value) in &updates {
        state.store.set_setting(setting, value).await?;
        info!(setting = %setting, "API key configured via settings API");
    }

    if let Some(path) = &state.toml_path {
        crate::config::sync_settings_to_toml(&updates, path);
    }

    let classifier = match state.reload_classifier().await {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "Classifier rebuild failed, keeping previous chain");
            state
                .record_error(format!("Classifier rebuild failed: {}", e))
                .await;
            state.runner().await.classifier_name().to_string()
        }
    };

    Ok(Json(SetApiKeysResponse {
        success: true,
        message: format!("Saved {} API key(s)", updates.len()),
        classifier,
    }))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings/api-keys", get(get_api_keys).post(set_api_keys))
}
