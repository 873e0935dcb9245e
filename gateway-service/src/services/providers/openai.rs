//! OpenAI provider implementation.
//!
//! Text completion via the Chat Completions API.

use super::{Completion, ModelInfo, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// OpenAI API base URL.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    api_key: Secret<String>,
    client: Client,
    models: Vec<ModelInfo>,
}

impl OpenAiAdapter {
    pub fn new(api_key: Secret<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        let models = vec![
            ModelInfo::new("gpt-4o", "GPT-4o", "gpt-4o"),
            ModelInfo::new("gpt-4o-mini", "GPT-4o Mini", "gpt-4o-mini"),
            ModelInfo::new("gpt-4-turbo", "GPT-4 Turbo", "gpt-4-turbo-preview"),
        ];

        Self {
            api_key,
            client,
            models,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion, ProviderError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let upstream_model = self.upstream_model(model);
        let request = ChatCompletionRequest {
            model: upstream_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        tracing::debug!(
            model = %upstream_model,
            prompt_len = prompt.len(),
            "Sending request to OpenAI API"
        );

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", OPENAI_API_BASE))
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

        let api_response: ChatCompletionResponse = response
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
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}
