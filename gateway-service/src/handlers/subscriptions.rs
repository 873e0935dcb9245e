//! Subscription lifecycle handlers.

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use gateway_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::middleware::AuthUser;
use crate::models::{AccountResponse, Payment, PaymentMethod, PlanTier, Subscription};
use crate::services::SubscribeOutcome;
use crate::AppState;

/// Plan selection payload.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub tier: String,
    pub payment_method: Option<PaymentMethod>,
}

/// Outcome of a plan selection.
///
/// Free plans apply immediately; paid plans answer with the pending
/// subscription and payment the caller must settle.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscribeResponse {
    Active {
        account: AccountResponse,
    },
    PaymentRequired {
        subscription: Subscription,
        payment: Payment,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_secret: Option<String>,
    },
}

/// Select a plan for the authenticated account.
///
/// POST /api/subscriptions
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeResponse>), AppError> {
    let account_id = user.account_id()?;

    let tier = PlanTier::from_string(&payload.tier)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown tier: {}", payload.tier)))?;

    let outcome = state
        .subscriptions
        .subscribe(account_id, tier, payload.payment_method)
        .await?;

    let (status, response) = match outcome {
        SubscribeOutcome::Applied(account) => (
            StatusCode::OK,
            SubscribeResponse::Active {
                account: account.sanitized(),
            },
        ),
        SubscribeOutcome::PaymentRequired {
            subscription,
            payment,
            client_secret,
        } => (
            StatusCode::ACCEPTED,
            SubscribeResponse::PaymentRequired {
                subscription,
                payment,
                client_secret,
            },
        ),
    };

    Ok((status, Json(response)))
}

/// Return the account's most recent non-canceled subscription.
///
/// GET /api/subscriptions/current
pub async fn current_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Subscription>, AppError> {
    let account_id = user.account_id()?;

    let subscription = state
        .subscriptions
        .current_subscription(account_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No subscription on record")))?;

    Ok(Json(subscription))
}

/// Cancel the current subscription and drop the account to the free plan.
///
/// DELETE /api/subscriptions/current
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Subscription>, AppError> {
    let account_id = user.account_id()?;

    let subscription = state.subscriptions.cancel(account_id).await?;

    Ok(Json(subscription))
}
