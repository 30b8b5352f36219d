//! Axum router — maps URL paths to handlers.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    health::health,
    info::{docs, root},
    predict::predict,
};
use crate::state::SharedState;

/// Build the router over an existing state handle, so the caller can flip
/// it to ready after the model loads.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/",        get(root))
        .route("/docs",    get(docs))
        .route("/predict", post(predict))
        .route("/health",  get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
