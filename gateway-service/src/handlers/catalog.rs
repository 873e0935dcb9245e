//! Public catalog handlers for plans and provider models.

use axum::extract::{Json, Path, State};
use gateway_core::error::AppError;

use crate::models::Plan;
use crate::services::providers::ModelInfo;
use crate::AppState;

/// List every subscription plan, cheapest first.
///
/// GET /api/plans
pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<Plan>> {
    Json(state.plans.list().to_vec())
}

/// List the models a provider exposes, in the provider's own order.
///
/// GET /api/models/:provider
pub async fn list_models(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<Vec<ModelInfo>>, AppError> {
    let adapter = state
        .dispatcher
        .adapter(&provider)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unknown provider: {provider}")))?;

    Ok(Json(adapter.models().to_vec()))
}
