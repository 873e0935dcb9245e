//! Stripe payment provider client.
//!
//! Implements the PaymentIntents API for card payments and webhook
//! signature verification for payment confirmation. When no API key is
//! configured the client issues simulated intents, so the subscription
//! flow works end to end in development without touching Stripe.

use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

/// Stripe configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base_url: String,
}

/// Stripe client for interacting with the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

/// A payment intent, real or simulated.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Intent id, e.g. `pi_...`.
    pub id: String,
    /// Secret the frontend uses to confirm the payment.
    pub client_secret: String,
    /// Intent status, e.g. `requires_payment_method`.
    pub status: String,
}

/// Stripe API error response.
#[derive(Debug, Deserialize)]
struct StripeError {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Webhook event delivered by Stripe.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    pub id: String,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if Stripe is configured (API key is set).
    pub fn is_configured(&self) -> bool {
        !self.config.secret_key.expose_secret().is_empty()
    }

    /// Create a payment intent for the given amount.
    ///
    /// `amount` is in major currency units; Stripe wants the smallest unit,
    /// so USD 9.99 goes over the wire as 999.
    pub async fn create_payment_intent(
        &self,
        amount: &Decimal,
        currency: &str,
    ) -> Result<PaymentIntent> {
        let amount_minor = (amount * Decimal::ONE_HUNDRED)
            .round()
            .to_u64()
            .ok_or_else(|| anyhow!("payment amount out of range: {}", amount))?;

        if !self.is_configured() {
            let id = format!("pi_{}", Uuid::new_v4().simple());
            tracing::warn!(
                intent_id = %id,
                "Stripe not configured; issuing simulated payment intent"
            );
            return Ok(PaymentIntent {
                client_secret: format!("{}_secret_{}", id, Uuid::new_v4().simple()),
                id,
                status: "requires_payment_method".to_string(),
            });
        }

        let url = format!("{}/payment_intents", self.config.api_base_url);
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), None::<&str>)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Stripe create_payment_intent response");

        if status.is_success() {
            let intent: PaymentIntent = serde_json::from_str(&body)?;
            tracing::info!(
                intent_id = %intent.id,
                amount_minor,
                currency,
                "Stripe payment intent created"
            );
            Ok(intent)
        } else {
            let error: StripeError = serde_json::from_str(&body).unwrap_or_else(|_| StripeError {
                error: StripeErrorDetail {
                    code: None,
                    message: body.clone(),
                },
            });
            tracing::error!(
                code = ?error.error.code,
                message = %error.error.message,
                "Stripe payment intent creation failed"
            );
            Err(anyhow!("Stripe error: {}", error.error.message))
        }
    }

    /// Verify webhook signature.
    ///
    /// The signature is computed as `HMAC-SHA256(request_body, webhook_secret)`.
    pub fn verify_webhook_signature(&self, body: &str, signature: &str) -> Result<bool> {
        let expected = sign_payload(self.config.webhook_secret.expose_secret(), body)?;

        let is_valid = expected == signature;
        if !is_valid {
            tracing::warn!("Webhook signature verification failed");
        }

        Ok(is_valid)
    }

    /// Parse webhook event from request body.
    pub fn parse_webhook_event(&self, body: &str) -> Result<WebhookEvent> {
        let event: WebhookEvent = serde_json::from_str(body)?;
        Ok(event)
    }
}

/// Compute the hex HMAC-SHA256 signature for a webhook payload.
pub fn sign_payload(secret: &str, payload: &str) -> Result<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| anyhow!("Invalid key length"))?;
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    Ok(hex::encode(result.into_bytes()))
}
