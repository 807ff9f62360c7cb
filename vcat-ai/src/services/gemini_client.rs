//! Google Gemini client
//!
//! Calls `models/{model}:generateContent` and reads the first candidate's
//! first text part.

use crate::error::ClassificationError;
use crate::services::classifier::{normalize_response, status_error, transport_error, Classifier};
use crate::services::prompt::build_prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vcat_common::Category;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const PROVIDER: &str = "gemini";
const USER_AGENT: &str = concat!("vcat-ai/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ClassificationError> {
        Self::with_base_url(GEMINI_BASE_URL, api_key, model, timeout)
    }

    /// Client against a different endpoint (test servers, proxies)
    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ClassificationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClassificationError::Network {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeout,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, ClassificationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status.as_u16(), text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ClassificationError::MalformedResponse {
                provider: PROVIDER.to_string(),
                message: "response has no candidate text".to_string(),
            })
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn classify(
        &self,
        vendor_name: &str,
        description: &str,
    ) -> Result<Category, ClassificationError> {
        let prompt = build_prompt(vendor_name, description);
        tracing::debug!(provider = PROVIDER, model = %self.model, vendor = %vendor_name, %prompt, "Sending prompt");

        let text = self.generate(&prompt).await?;
        tracing::debug!(provider = PROVIDER, vendor = %vendor_name, response = %text, "Model response");

        normalize_response(&text)
    }

    async fn check_connection(&self) -> Result<String, ClassificationError> {
        let response = self
            .http_client
            .get(format!("{}/v1beta/models", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status.as_u16(), text));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;
        let gemini_models = list
            .models
            .iter()
            .filter(|m| m.name.to_lowercase().contains("gemini"))
            .count();

        Ok(format!(
            "{} reachable, {} gemini models listed, using {}",
            PROVIDER, gemini_models, self.model
        ))
    }
}
