//! Prompt submission handler.
//!
//! By the time this handler runs the request has already passed the
//! auth and quota middleware, so its only job is payload validation
//! and dispatch. Validation failures still consume quota; that is the
//! documented cost of submitting a malformed request.

use axum::extract::{Json, State};
use gateway_core::error::AppError;
use serde::Deserialize;
use validator::Validate;

use crate::services::providers::Completion;
use crate::AppState;

/// Prompt submission payload.
///
/// Fields default to empty strings so a missing field fails length
/// validation with a 400 rather than a serde rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct PromptRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "model is required"))]
    pub model: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
}

/// Forward a prompt to the requested provider.
///
/// POST /api/prompt
pub async fn submit_prompt(
    State(state): State<AppState>,
    Json(payload): Json<PromptRequest>,
) -> Result<Json<Completion>, AppError> {
    payload.validate()?;

    let completion = state
        .dispatcher
        .dispatch(&payload.provider, &payload.model, &payload.prompt)
        .await?;

    Ok(Json(completion))
}
