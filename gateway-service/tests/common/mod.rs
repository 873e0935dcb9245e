//! Test helper module for gateway-service integration tests.
//!
//! Spawns the full application on a random port with the mock provider
//! enabled and no external payment processors configured, so every test
//! runs self-contained.

#![allow(dead_code)]

use std::sync::Arc;

use gateway_core::config::Config as CoreConfig;
use gateway_service::config::{AuthConfig, GatewayConfig, PaymentConfig, ProviderConfig};
use gateway_service::services::payments::{BitcoinConfig, StripeConfig};
use gateway_service::services::AccountStore;
use gateway_service::startup::Application;
use rust_decimal::Decimal;
use secrecy::Secret;

/// Webhook secret used by the test config; signed payloads in tests use
/// the same value.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    /// Direct handle to the account store, for reading or adjusting quota
    /// state behind the API's back.
    pub accounts: Arc<dyn AccountStore>,
}

impl TestApp {
    /// Spawn a new test application on a random port.
    pub async fn spawn() -> Self {
        let config = GatewayConfig {
            common: CoreConfig {
                port: 0, // Random port
                log_level: "warn".to_string(),
            },
            service_name: "gateway-service-test".to_string(),
            auth: AuthConfig {
                jwt_secret: Secret::new("test-jwt-secret".to_string()),
                token_expiry_hours: 1,
                // High enough that tests never trip the IP limiter.
                rate_limit_attempts: 500,
                rate_limit_window_seconds: 60,
            },
            providers: ProviderConfig {
                openai_api_key: Secret::new(String::new()),
                gemini_api_key: Secret::new(String::new()),
                deepseek_api_key: Secret::new(String::new()),
                anthropic_api_key: Secret::new(String::new()),
                mock_enabled: true,
            },
            payments: PaymentConfig {
                stripe: StripeConfig {
                    // Empty key keeps the client in simulated-intent mode.
                    secret_key: Secret::new(String::new()),
                    webhook_secret: Secret::new(TEST_WEBHOOK_SECRET.to_string()),
                    api_base_url: "http://127.0.0.1:9".to_string(),
                },
                bitcoin: BitcoinConfig {
                    receive_address: "bc1qtestaddress".to_string(),
                    explorer_api_base: "http://127.0.0.1:9".to_string(),
                    btc_usd_rate: Decimal::from(50_000),
                },
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let accounts = app.accounts();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            accounts,
        }
    }

    /// Register an account and return its access token and sanitized record.
    pub async fn register(&self, email: &str) -> (String, serde_json::Value) {
        let response = self
            .client
            .post(format!("{}/api/auth/register", self.address))
            .json(&serde_json::json!({
                "email": email,
                "password": "correct-horse-battery",
                "display_name": "Test User"
            }))
            .send()
            .await
            .expect("Failed to execute register request");

        assert_eq!(response.status().as_u16(), 201, "registration should succeed");

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        let token = body["token"]["access_token"]
            .as_str()
            .expect("register response should include an access token")
            .to_string();

        (token, body["account"].clone())
    }

    /// Submit a prompt as the given account.
    pub async fn post_prompt(
        &self,
        token: &str,
        provider: &str,
        model: &str,
        prompt: &str,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/api/prompt", self.address))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "provider": provider,
                "model": model,
                "prompt": prompt
            }))
            .send()
            .await
            .expect("Failed to execute prompt request")
    }

    /// Fetch the authenticated account's profile.
    pub async fn me(&self, token: &str) -> serde_json::Value {
        let response = self
            .client
            .get(format!("{}/api/auth/me", self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute profile request");

        assert!(response.status().is_success(), "profile fetch should succeed");

        response.json().await.expect("Failed to parse JSON")
    }
}
