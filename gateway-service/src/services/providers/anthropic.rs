//! Anthropic provider implementation.
//!
//! Text completion via the Messages API.

use super::{Completion, ModelInfo, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Anthropic API base URL.
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";

/// API version header required by Anthropic.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Output cap per request. The demo surfaces short completions only.
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicAdapter {
    api_key: Secret<String>,
    client: Client,
    models: Vec<ModelInfo>,
}

impl AnthropicAdapter {
    pub fn new(api_key: Secret<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        let models = vec![
            ModelInfo::new(
                "claude-3-5-sonnet",
                "Claude 3.5 Sonnet",
                "claude-3-5-sonnet-20241022",
            ),
            ModelInfo::new(
                "claude-3-5-haiku",
                "Claude 3.5 Haiku",
                "claude-3-5-haiku-20241022",
            ),
            ModelInfo::new("claude-3-opus", "Claude 3 Opus", "claude-3-opus-20240229"),
        ];

        Self {
            api_key,
            client,
            models,
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> &'static str {
        "anthropic"
    }

    fn display_name(&self) -> &'static str {
        "Anthropic"
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion, ProviderError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Anthropic API key not configured".to_string(),
            ));
        }

        let upstream_model = self.upstream_model(model);
        let request = MessagesRequest {
            model: upstream_model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        tracing::debug!(
            model = %upstream_model,
            prompt_len = prompt.len(),
            "Sending request to Anthropic API"
        );

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/messages", ANTHROPIC_API_BASE))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                message: error_text,
            });
        }

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let text = api_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .next()
            .ok_or_else(|| {
                ProviderError::Malformed("response contained no text content".to_string())
            })?;

        let tokens = api_response
            .usage
            .map(|u| u.input_tokens + u.output_tokens);

        Ok(Completion {
            text,
            tokens,
            provider: self.id().to_string(),
            model: model.to_string(),
            duration_ms,
        })
    }
}

// ============================================================================
// Anthropic API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}
