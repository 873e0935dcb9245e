//! Account model - the per-user record that the quota gate reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::plan::{Plan, PlanTier, RequestAllowance};

/// Account entity. Holds the credential hash alongside the quota counters,
/// so a single record drives both authentication and the request gate.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub tier: PlanTier,
    pub requests_remaining: RequestAllowance,
    pub requests_reset_at: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl Account {
    /// Create a new account seeded from a plan. The reset timestamp starts
    /// unset and is only assigned once the allowance is first exhausted.
    pub fn new(
        email: String,
        password_hash: String,
        display_name: Option<String>,
        plan: &Plan,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            display_name,
            tier: plan.tier,
            requests_remaining: plan.requests_per_day,
            requests_reset_at: None,
            created_utc: Utc::now(),
        }
    }

    /// Convert to sanitized response (no credential hash).
    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse::from(self.clone())
    }
}

/// Request to register a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub display_name: Option<String>,
}

/// Request to login with email/password.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account response for API (without sensitive fields).
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub tier: PlanTier,
    pub requests_remaining: RequestAllowance,
    pub requests_reset_at: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            display_name: a.display_name,
            tier: a.tier,
            requests_remaining: a.requests_remaining,
            requests_reset_at: a.requests_reset_at,
            created_utc: a.created_utc,
        }
    }
}

/// Token response after successful auth.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl TokenResponse {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Auth response with account info and token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub account: AccountResponse,
    pub token: TokenResponse,
}
