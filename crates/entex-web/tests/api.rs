//! End-to-end tests of the HTTP surface over scripted models.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use entex_config::Settings;
use entex_test_utils::{failing_model, ronaldo_record, scripted_model, ScriptedPredictor};
use entex_web::{
    error::ErrorResponse,
    router::build_router,
    schemas::{HealthResponse, InfoResponse},
    state::AppState,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn not_ready() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Settings::default()));
    (build_router(Arc::clone(&state)), state)
}

fn ready_with(records: Vec<Value>) -> (Router, Arc<ScriptedPredictor>) {
    let (router, state) = not_ready();
    let (model, predictor) = scripted_model(records);
    assert!(state.mark_ready(model));
    (router, predictor)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn detail(body: Value) -> String {
    serde_json::from_value::<ErrorResponse>(body).unwrap().detail
}

#[tokio::test]
async fn test_root_is_served_before_ready() {
    let (router, _) = not_ready();
    let (status, body) = send(&router, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_value::<InfoResponse>(body).unwrap(),
        InfoResponse {
            name: "GLiNER Entity Extraction API".to_string(),
            version: "1.0.0".to_string(),
            description: "GLiNER Entity Extraction API".to_string(),
            docs: "/docs".to_string(),
            health: "/health".to_string(),
        }
    );
}

#[tokio::test]
async fn test_docs_lists_endpoints() {
    let (router, _) = not_ready();
    let (status, body) = send(&router, get("/docs")).await;

    assert_eq!(status, StatusCode::OK);
    let paths: Vec<&str> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/predict"));
    assert_eq!(body["examples"]["text_input"]["labels"], json!(["person", "team"]));
}

#[tokio::test]
async fn test_not_ready_returns_503() {
    let (router, _) = not_ready();

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(detail(body), "Model not loaded");

    let request = post_json("/predict", &json!({ "text": "x", "labels": [] }));
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(detail(body), "Model not loaded");
}

#[tokio::test]
async fn test_endpoints_work_after_ready() {
    let (router, state) = not_ready();
    let (status, _) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (model, _) = scripted_model(vec![ronaldo_record()]);
    state.mark_ready(model);

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_value::<HealthResponse>(body).unwrap(),
        HealthResponse {
            status: "healthy".to_string(),
            model_name: "dslim/bert-base-NER".to_string(),
            version: "1.0.0".to_string(),
        }
    );
}

#[tokio::test]
async fn test_ronaldo_prediction() {
    let (router, _) = ready_with(vec![ronaldo_record()]);
    let request = post_json(
        "/predict",
        &json!({ "text": "Cristiano Ronaldo plays for Al Nassr.", "labels": ["person", "team"] }),
    );

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Cristiano Ronaldo => person"]));
}

#[tokio::test]
async fn test_prediction_order_and_remapping() {
    let (router, _) = ready_with(vec![
        json!({ "text": "Al Nassr", "label": "ORG", "start": 28, "end": 36, "score": 0.9 }),
        json!("not a record"),
        ronaldo_record(),
        json!({ "text": "Ballon d'Or", "label": "custom", "start": 40, "end": 51, "score": 0.7 }),
    ]);
    let request = post_json("/predict", &json!({ "text": "...", "labels": ["person"] }));

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            "Cristiano Ronaldo => person",
            "Al Nassr => teams",
            "Ballon d'Or => custom"
        ])
    );
}

#[tokio::test]
async fn test_labels_must_be_a_list() {
    let (router, predictor) = ready_with(vec![ronaldo_record()]);
    let request = post_json("/predict", &json!({ "text": "x", "labels": "person" }));

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(detail(body).contains("labels"));
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn test_text_is_required() {
    let (router, predictor) = ready_with(vec![ronaldo_record()]);
    let request = post_json("/predict", &json!({ "labels": ["person"] }));

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(detail(body).contains("text"));
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (router, predictor) = ready_with(vec![ronaldo_record()]);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"text\": "))
        .unwrap();

    let (status, _) = send(&router, request).await;
    assert!(status.is_client_error());
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn test_prediction_failure_returns_message() {
    let (router, state) = not_ready();
    state.mark_ready(failing_model("tensor shape mismatch"));
    let request = post_json("/predict", &json!({ "text": "x", "labels": ["person"] }));

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = detail(body);
    assert!(message.contains("tensor shape mismatch"), "got {message}");
    assert!(message.starts_with("Prediction failed"));
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let (router, predictor) = ready_with(vec![
        json!({ "text": "Portugal", "label": "LOC", "start": 60, "end": 68 }),
        ronaldo_record(),
    ]);
    let body = json!({ "text": "Cristiano Ronaldo ... Portugal", "labels": ["person"] });

    let (_, first) = send(&router, post_json("/predict", &body)).await;
    let (_, second) = send(&router, post_json("/predict", &body)).await;
    assert_eq!(first, second);
    assert_eq!(predictor.calls(), 2);
}
