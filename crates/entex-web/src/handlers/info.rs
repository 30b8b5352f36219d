//! Static service metadata. Served in every state.

use axum::{extract::State, Json};

use crate::schemas::{entity_example, DocsResponse, EndpointDoc, InfoResponse, TextInput};
use crate::state::SharedState;

const DESCRIPTION: &str = "GLiNER Entity Extraction API";

/// GET / — service name, version and pointers
pub async fn root(State(state): State<SharedState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: state.settings.project_name.clone(),
        version: state.settings.version.clone(),
        description: DESCRIPTION.to_string(),
        docs: "/docs".to_string(),
        health: "/health".to_string(),
    })
}

/// GET /docs — endpoint listing with example payloads
pub async fn docs(State(state): State<SharedState>) -> Json<DocsResponse> {
    let endpoints = [
        ("GET", "/", "Service information"),
        ("POST", "/predict", "Extract entities as \"<text> => <label>\" strings"),
        ("GET", "/health", "Model readiness"),
        ("GET", "/docs", "This listing"),
    ]
    .into_iter()
    .map(|(method, path, summary)| EndpointDoc {
        method: method.to_string(),
        path: path.to_string(),
        summary: summary.to_string(),
    })
    .collect();

    Json(DocsResponse {
        title: state.settings.project_name.clone(),
        version: state.settings.version.clone(),
        endpoints,
        examples: serde_json::json!({
            "text_input": TextInput::example(),
            "entity": entity_example(),
        }),
    })
}
