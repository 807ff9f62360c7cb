//! Groq client (OpenAI-compatible chat completions)

use crate::error::ClassificationError;
use crate::services::classifier::{normalize_response, status_error, transport_error, Classifier};
use crate::services::prompt::{build_prompt, SYSTEM_PROMPT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vcat_common::Category;

pub const GROQ_BASE_URL: &str = "https://api.groq.com";
const PROVIDER: &str = "groq";
const USER_AGENT: &str = concat!("vcat-ai/", env!("CARGO_PKG_VERSION"));
const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

/// Groq API client
pub struct GroqClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ClassificationError> {
        Self::with_base_url(GROQ_BASE_URL, api_key, model, timeout)
    }

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
}

#[async_trait]
impl Classifier for GroqClient {
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

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(format!("{}/openai/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status.as_u16(), text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassificationError::MalformedResponse {
                provider: PROVIDER.to_string(),
                message: "response has no choices".to_string(),
            })?;
        tracing::debug!(provider = PROVIDER, vendor = %vendor_name, response = %text, "Model response");

        normalize_response(&text)
    }

    async fn check_connection(&self) -> Result<String, ClassificationError> {
        let response = self
            .http_client
            .get(format!("{}/openai/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
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
        let available = list.data.iter().any(|m| m.id == self.model);

        Ok(format!(
            "{} reachable, {} models listed, {} {}",
            PROVIDER,
            list.data.len(),
            self.model,
            if available { "available" } else { "not listed" }
        ))
    }
}
