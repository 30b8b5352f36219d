use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::schemas::HealthResponse;
use crate::state::{Readiness, SharedState};

/// GET /health — 503 until the model is loaded
pub async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    if state.readiness() == Readiness::NotReady {
        return Err(ApiError::NotReady);
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        model_name: state.settings.model_name.clone(),
        version: state.settings.version.clone(),
    }))
}
