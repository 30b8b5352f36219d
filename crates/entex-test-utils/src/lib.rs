//! Test doubles for [`EntityPredictor`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use entex_ner::{EntityPredictor, NerModel};
use serde_json::{json, Value};

pub const RONALDO_TEXT: &str = "Cristiano Ronaldo plays for Al Nassr.";

/// The single record a model returns for [`RONALDO_TEXT`].
pub fn ronaldo_record() -> Value {
    json!({
        "text": "Cristiano Ronaldo",
        "label": "PERSON",
        "start": 0,
        "end": 17,
        "score": 0.95
    })
}

/// Returns the same records on every call and counts how often it ran.
#[derive(Debug, Default)]
pub struct ScriptedPredictor {
    records: Vec<Value>,
    calls: AtomicUsize,
}

impl ScriptedPredictor {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EntityPredictor for ScriptedPredictor {
    fn predict_entities(&self, _text: &str, _labels: &[String]) -> anyhow::Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// Fails every call with a fixed message.
#[derive(Debug)]
pub struct FailingPredictor {
    message: String,
}

impl FailingPredictor {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl EntityPredictor for FailingPredictor {
    fn predict_entities(&self, _text: &str, _labels: &[String]) -> anyhow::Result<Vec<Value>> {
        Err(anyhow!(self.message.clone()))
    }
}

/// A [`NerModel`] over scripted records, plus a handle for inspecting calls.
pub fn scripted_model(records: Vec<Value>) -> (NerModel, Arc<ScriptedPredictor>) {
    let predictor = Arc::new(ScriptedPredictor::new(records));
    (NerModel::new("test/scripted", Arc::clone(&predictor)), predictor)
}

pub fn failing_model(message: &str) -> NerModel {
    NerModel::new("test/failing", FailingPredictor::new(message))
}

pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
