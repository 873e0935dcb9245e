//! Provider dispatch. Routes a validated prompt to the adapter registered
//! under the requested provider id.

use std::sync::Arc;

use gateway_core::error::AppError;

use crate::services::metrics;
use crate::services::providers::{Completion, ProviderAdapter};

pub struct ProviderDispatcher {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl ProviderDispatcher {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    /// Look up an adapter by provider id.
    pub fn adapter(&self, provider: &str) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.iter().find(|a| a.id() == provider)
    }

    /// Registered adapters in registration order.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.adapters.iter()
    }

    /// Route a prompt to the named provider. An unknown provider id is
    /// rejected here, before any network traffic. Upstream failures are not
    /// retried; the error carries the provider's own status and message.
    pub async fn dispatch(
        &self,
        provider: &str,
        model: &str,
        prompt: &str,
    ) -> Result<Completion, AppError> {
        let adapter = self
            .adapter(provider)
            .ok_or_else(|| AppError::UnsupportedProvider(provider.to_string()))?;

        tracing::debug!(provider, model, "Dispatching prompt");

        match adapter.generate(model, prompt).await {
            Ok(completion) => {
                metrics::record_prompt(provider, model, "ok");
                metrics::record_provider_latency(
                    provider,
                    model,
                    completion.duration_ms as f64 / 1000.0,
                );
                Ok(completion)
            }
            Err(err) => {
                tracing::warn!(provider, model, error = %err, "Provider dispatch failed");
                metrics::record_prompt(provider, model, "error");
                metrics::record_provider_error(provider, err.kind());
                Err(err.into_app_error(provider))
            }
        }
    }
}
