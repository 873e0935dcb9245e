//! DeepSeek provider implementation.
//!
//! DeepSeek exposes an OpenAI-compatible Chat Completions API under its
//! own base URL.

use super::{Completion, ModelInfo, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// DeepSeek API base URL.
const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";

pub struct DeepSeekAdapter {
    api_key: Secret<String>,
    client: Client,
    models: Vec<ModelInfo>,
}

impl DeepSeekAdapter {
    pub fn new(api_key: Secret<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        let models = vec![
            ModelInfo::new("deepseek-chat", "DeepSeek Chat", "deepseek-chat"),
            ModelInfo::new("deepseek-reasoner", "DeepSeek Reasoner", "deepseek-reasoner"),
        ];

        Self {
            api_key,
            client,
            models,
        }
    }
}

#[async_trait]
impl ProviderAdapter for DeepSeekAdapter {
    fn id(&self) -> &'static str {
        "deepseek"
    }

    fn display_name(&self) -> &'static str {
        "DeepSeek"
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion, ProviderError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "DeepSeek API key not configured".to_string(),
            ));
        }

        let upstream_model = self.upstream_model(model);
        let request = CompletionRequest {
            model: upstream_model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        tracing::debug!(
            model = %upstream_model,
            prompt_len = prompt.len(),
            "Sending request to DeepSeek API"
        );

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", DEEPSEEK_API_BASE))
            .bearer_auth(self.api_key.expose_secret())
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

        let api_response: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::Malformed("response contained no choices".to_string())
            })?;

        Ok(Completion {
            text,
            tokens: api_response.usage.map(|u| u.total_tokens),
            provider: self.id().to_string(),
            model: model.to_string(),
            duration_ms,
        })
    }
}

// ============================================================================
// DeepSeek API Request/Response Types (OpenAI-compatible)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}
