//! Gemini provider implementation.
//!
//! Text completion using Google's Gemini generateContent API.

use super::{Completion, ModelInfo, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiAdapter {
    api_key: Secret<String>,
    client: Client,
    models: Vec<ModelInfo>,
}

impl GeminiAdapter {
    pub fn new(api_key: Secret<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        let models = vec![
            ModelInfo::new("gemini-2.0-flash", "Gemini 2.0 Flash", "gemini-2.0-flash"),
            ModelInfo::new("gemini-1.5-pro", "Gemini 1.5 Pro", "gemini-1.5-pro"),
            ModelInfo::new("gemini-1.5-flash", "Gemini 1.5 Flash", "gemini-1.5-flash"),
        ];

        Self {
            api_key,
            client,
            models,
        }
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE,
            model,
            method,
            self.api_key.expose_secret()
        )
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> &'static str {
        "gemini"
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion, ProviderError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let upstream_model = self.upstream_model(model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![ContentPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = self.api_url(&upstream_model, "generateContent");

        tracing::debug!(
            model = %upstream_model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
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

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                ProviderError::Malformed("response contained no candidates".to_string())
            })?;

        let tokens = api_response
            .usage_metadata
            .and_then(|u| u.total_token_count);

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
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}
