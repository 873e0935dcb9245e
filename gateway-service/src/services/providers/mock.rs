//! Mock provider implementation for testing.

use super::{Completion, ModelInfo, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Mock adapter that echoes the prompt back without any network traffic.
/// Counts calls so tests can assert that no dispatch happened.
pub struct MockAdapter {
    models: Vec<ModelInfo>,
    calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            models: vec![ModelInfo::new("mock-echo", "Mock Echo", "mock-echo")],
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of generate calls this adapter has served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock"
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let started = Instant::now();
        // Simulate some processing
        tokio::time::sleep(tokio::time::Duration::from_millis(25)).await;

        Ok(Completion {
            text: format!("Mock response for: {}", prompt),
            tokens: Some(prompt.len() as u32 / 4 + 10),
            provider: self.id().to_string(),
            model: model.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
