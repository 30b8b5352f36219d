//! Entity prediction endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use entex_ner::NerError;
use tracing::debug;

use crate::error::ApiError;
use crate::schemas::TextInput;
use crate::state::SharedState;

/// POST /predict — one `"<text> => <label>"` string per entity, by start offset
pub async fn predict(
    State(state): State<SharedState>,
    payload: Result<Json<TextInput>, JsonRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let model = state.model().ok_or(ApiError::NotReady)?;
    let Json(input) = payload?;

    debug!(
        "Predicting over {} chars with {} labels",
        input.text.chars().count(),
        input.labels.len()
    );

    // Inference is CPU-bound; keep it off the async workers.
    let entities = tokio::task::spawn_blocking(move || model.predict(&input.text, &input.labels))
        .await
        .map_err(NerError::prediction)??;

    Ok(Json(entities.iter().map(ToString::to_string).collect()))
}
