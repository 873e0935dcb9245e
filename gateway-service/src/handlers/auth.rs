//! Account registration, login, and profile handlers.
//!
//! New accounts always land on the free plan; upgrades go through the
//! subscription handlers. Login failures for unknown emails and wrong
//! passwords return the same message so the endpoint does not leak
//! which addresses are registered.

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use gateway_core::error::AppError;
use validator::Validate;

use crate::models::{
    Account, AccountResponse, AuthResponse, LoginRequest, RegisterRequest, TokenResponse,
};
use crate::utils::{hash_password, verify_password};
use crate::AppState;

/// Register a new account on the free plan.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let password_hash = hash_password(&payload.password).map_err(AppError::InternalError)?;

    let account = Account::new(
        payload.email,
        password_hash,
        payload.display_name,
        state.plans.default_plan(),
    );

    // Duplicate emails surface as 409 from the store.
    let account = state.accounts.insert(account).await?;

    let token = state
        .jwt
        .generate_access_token(account.id, &account.email)
        .map_err(AppError::InternalError)?;

    tracing::info!(account_id = %account.id, "Account registered");

    let response = AuthResponse {
        account: account.sanitized(),
        token: TokenResponse::new(token, state.jwt.token_expiry_seconds()),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange email and password for an access token.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = state
        .accounts
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

    verify_password(&payload.password, &account.password_hash)
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

    let token = state
        .jwt
        .generate_access_token(account.id, &account.email)
        .map_err(AppError::InternalError)?;

    tracing::info!(account_id = %account.id, "Account logged in");

    Ok(Json(AuthResponse {
        account: account.sanitized(),
        token: TokenResponse::new(token, state.jwt.token_expiry_seconds()),
    }))
}

/// Return the authenticated account's profile and quota standing.
///
/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: crate::middleware::AuthUser,
) -> Result<Json<AccountResponse>, AppError> {
    let account_id = user.account_id()?;

    let account = state
        .accounts
        .find(account_id)
        .await?
        .ok_or(AppError::AccountNotFound(account_id))?;

    Ok(Json(account.sanitized()))
}
