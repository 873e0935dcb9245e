//! Payment status, bitcoin polling, and card webhook handlers.

use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
};
use gateway_core::error::AppError;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::models::Payment;
use crate::AppState;

const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Fetch one of the account's payments.
///
/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let account_id = user.account_id()?;

    let payment = state.subscriptions.get_payment(payment_id, account_id)?;

    Ok(Json(payment))
}

/// Poll the chain for a bitcoin deposit and activate on arrival.
///
/// POST /api/payments/:id/check
pub async fn check_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let account_id = user.account_id()?;

    let payment = state
        .subscriptions
        .check_bitcoin_payment(payment_id, account_id)
        .await?;

    Ok(Json(payment))
}

/// Receive card payment outcomes from the processor.
///
/// POST /api/payments/webhook
///
/// The body is taken raw because the signature covers the exact bytes
/// sent, not a re-serialized form.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing webhook signature")))?;

    state
        .subscriptions
        .handle_card_webhook(signature, &body)
        .await?;

    Ok(Json(json!({ "received": true })))
}
