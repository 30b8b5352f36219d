//! Request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `POST /predict` body. Only shape is checked, not length or emptiness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInput {
    pub text: String,
    pub labels: Vec<String>,
}

impl TextInput {
    pub fn example() -> Value {
        json!({
            "text": "Cristiano Ronaldo plays for Al Nassr.",
            "labels": ["person", "team"]
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub docs: String,
    pub health: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDoc {
    pub method: String,
    pub path: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsResponse {
    pub title: String,
    pub version: String,
    pub endpoints: Vec<EndpointDoc>,
    pub examples: Value,
}

pub fn entity_example() -> Value {
    json!({
        "text": "Cristiano Ronaldo",
        "label": "person",
        "start": 0,
        "end": 17,
        "score": 0.99
    })
}
