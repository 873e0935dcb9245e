//! Quota gate middleware. Sits between authentication and the prompt
//! handler; a denied request never reaches provider dispatch.

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use gateway_core::error::AppError;
use uuid::Uuid;

use crate::services::{AccessTokenClaims, metrics, quota};
use crate::startup::AppState;

/// Spend one request from the authenticated account's daily allowance.
///
/// The evaluation runs inside an atomic store update, so two in-flight
/// requests for the same account cannot both spend the last slot.
pub async fn quota_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<AccessTokenClaims>()
        .ok_or_else(|| AppError::Unauthorized(anyhow!("authentication required")))?;

    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized(anyhow!("malformed token subject")))?;

    let registry = state.plans.clone();
    let now = Utc::now();

    let mut decision = Ok(());
    state
        .accounts
        .update(account_id, &mut |account| {
            decision = quota::evaluate(account, &registry, now);
        })
        .await?;

    if let Err(err) = decision {
        if let AppError::QuotaExceeded { tier, .. } = &err {
            metrics::record_quota_denied(tier);
            tracing::info!(
                account_id = %account_id,
                tier = %tier,
                "Request denied by quota gate"
            );
        }
        return Err(err);
    }

    Ok(next.run(req).await)
}
