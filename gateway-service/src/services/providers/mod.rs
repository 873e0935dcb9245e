//! AI provider abstractions and implementations.
//!
//! Each provider implements the same adapter trait, so the dispatcher can
//! route a prompt by provider id without knowing any upstream wire format.

pub mod anthropic;
pub mod deepseek;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use deepseek::DeepSeekAdapter;
pub use gemini::GeminiAdapter;
pub use mock::MockAdapter;
pub use openai::OpenAiAdapter;

use async_trait::async_trait;
use gateway_core::error::AppError;
use serde::Serialize;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Api { .. } => "api",
            ProviderError::Network(_) => "network",
            ProviderError::Malformed(_) => "malformed",
        }
    }

    /// Convert into the API error type, preserving the upstream status and
    /// message so the caller sees what actually failed.
    pub fn into_app_error(self, provider: &str) -> AppError {
        match self {
            ProviderError::Api { status, message } => AppError::Provider {
                provider: provider.to_string(),
                status: Some(status),
                message,
            },
            other => AppError::Provider {
                provider: provider.to_string(),
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Normalized completion returned by every adapter, whatever shape the
/// upstream API uses.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    #[serde(rename = "response")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    pub provider: String,
    pub model: String,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// A model exposed by a provider. `id` is the stable identifier clients
/// send; `upstream` is what the provider API expects.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub upstream: String,
}

impl ModelInfo {
    pub fn new(id: &str, name: &str, upstream: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            upstream: upstream.to_string(),
        }
    }
}

/// Trait for prompt completion providers.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider id used in routing and responses.
    fn id(&self) -> &'static str;

    /// Human-readable provider name.
    fn display_name(&self) -> &'static str;

    /// Models this provider exposes, in catalog order.
    fn models(&self) -> &[ModelInfo];

    /// Send a prompt to the provider and normalize the result.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion, ProviderError>;

    /// Map a client-facing model id to the upstream identifier. Unknown ids
    /// pass through unchanged and the upstream API reports them.
    fn upstream_model(&self, model: &str) -> String {
        self.models()
            .iter()
            .find(|m| m.id == model)
            .map(|m| m.upstream.clone())
            .unwrap_or_else(|| model.to_string())
    }
}
