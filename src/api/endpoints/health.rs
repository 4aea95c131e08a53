//! Health and model status endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::ModelStatuses;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mock_mode: bool,
    pub platform: &'static str,
    pub version: &'static str,
    pub models: ModelStatuses,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    // Status reads wait on the load lock while a model is loading.
    let models = ctx.blocking(|core| core.model_statuses()).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        mock_mode: ctx.core.config.mock_mode,
        platform: std::env::consts::ARCH,
        version: crate::config::APP_VERSION,
        models,
    }))
}

/// `GET /api/models`
pub async fn models(State(ctx): State<ApiContext>) -> Result<Json<ModelStatuses>, ApiError> {
    Ok(Json(ctx.blocking(|core| core.model_statuses()).await?))
}
