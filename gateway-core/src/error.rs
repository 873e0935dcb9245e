use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Authentication failed: {0}")]
    AuthError(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("No account record for identity: {0}")]
    AccountNotFound(uuid::Uuid),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Quota exceeded for tier {tier}")]
    QuotaExceeded {
        tier: String,
        next_reset: DateTime<Utc>,
    },

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("No plan configured for tier: {0}")]
    PlanNotFound(String),

    #[error("Provider {provider} failed: {message}")]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        #[derive(Serialize)]
        struct QuotaExceededResponse {
            error: String,
            subscription_tier: String,
            next_reset: DateTime<Utc>,
        }

        let (status, error_message, details, retry_after) = match self {
            // Quota denials carry a structured body and a Retry-After header.
            AppError::QuotaExceeded { tier, next_reset } => {
                let retry_after = (next_reset - Utc::now()).num_seconds().max(0) as u64;
                let mut res = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(QuotaExceededResponse {
                        error: "Daily request quota exceeded".to_string(),
                        subscription_tier: tier,
                        next_reset,
                    }),
                )
                    .into_response();
                res.headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, retry_after.into());
                return res;
            }
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None, None),
            AppError::UnsupportedProvider(provider) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported provider: {}", provider),
                None,
                None,
            ),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None, None),
            AppError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string(), None, None),
            AppError::AuthError(err) => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string(), None, None),
            AppError::AccountNotFound(id) => (
                StatusCode::FORBIDDEN,
                "No account record for authenticated identity".to_string(),
                Some(id.to_string()),
                None,
            ),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), None, None),
            AppError::TooManyRequests(msg, retry) => {
                (StatusCode::TOO_MANY_REQUESTS, msg, None, retry)
            }
            AppError::PlanNotFound(tier) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Plan configuration error".to_string(),
                Some(format!("no plan configured for tier: {}", tier)),
                None,
            ),
            AppError::Provider {
                provider,
                status,
                message,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Provider error".to_string(),
                Some(match status {
                    Some(code) => format!("{} returned status {}: {}", provider, code, message),
                    None => format!("{}: {}", provider, message),
                }),
                None,
            ),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
                None,
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
