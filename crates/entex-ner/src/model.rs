//! Model adapter: lifecycle of the loaded model and output normalization.

use std::fmt;
use std::time::Instant;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{BertTokenClassifier, EntityPredictor, LabelMap, NerError, Result};

/// Sample run once at startup to force lazy initialization.
pub const WARM_UP_TEXT: &str = "Cristiano Ronaldo dos Santos Aveiro is a Portuguese professional \
    footballer who plays for Al Nassr and the Portugal national team.";

pub const WARM_UP_LABELS: [&str; 5] = ["person", "team", "date", "award", "competitions"];

/// A labeled span of the input text.
///
/// `start` and `end` are character offsets as reported by the model; they
/// are not checked against the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: i64,
    pub end: i64,
    pub score: f64,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.text, self.label)
    }
}

/// A loaded model plus the label table applied to its output.
pub struct NerModel {
    model_id: String,
    predictor: Box<dyn EntityPredictor>,
    label_map: LabelMap,
}

impl fmt::Debug for NerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NerModel")
            .field("model_id", &self.model_id)
            .field("label_map", &self.label_map)
            .field("predictor", &"<loaded model>")
            .finish()
    }
}

impl NerModel {
    /// Download (or reuse from the local hub cache) and load `model_id`.
    pub async fn load(model_id: &str) -> Result<Self> {
        let start = Instant::now();
        info!("Loading model {}...", model_id);

        let classifier = BertTokenClassifier::load(model_id, LabelMap::default())
            .await
            .map_err(|e| {
                error!("Error loading model: {:#}", e);
                NerError::model_load(model_id, e)
            })?;

        info!("Model loaded successfully in {:.2}s", start.elapsed().as_secs_f32());
        Ok(Self::new(model_id, classifier))
    }

    /// Wrap an already constructed predictor.
    pub fn new(model_id: impl Into<String>, predictor: impl EntityPredictor + 'static) -> Self {
        Self {
            model_id: model_id.into(),
            predictor: Box::new(predictor),
            label_map: LabelMap::default(),
        }
    }

    pub fn with_label_map(mut self, label_map: LabelMap) -> Self {
        self.label_map = label_map;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Extract entities from `text`, sorted by start offset.
    ///
    /// Records that are not objects are skipped with a warning. A record
    /// whose fields cannot be coerced fails the whole call.
    pub fn predict(&self, text: &str, labels: &[String]) -> Result<Vec<Entity>> {
        let raw = self.predictor.predict_entities(text, labels).map_err(|e| {
            error!("Prediction error: {:#}", e);
            NerError::prediction(e)
        })?;

        let mut entities = Vec::with_capacity(raw.len());
        for value in raw {
            let record = match value {
                Value::Object(record) => record,
                other => {
                    warn!("Unexpected prediction format: {}", other);
                    continue;
                }
            };
            let entity = self.normalize(&record).map_err(|e| {
                error!("Prediction error: {:#}", e);
                NerError::prediction(e)
            })?;
            entities.push(entity);
        }

        // sort_by_key is stable, equal starts keep model order
        entities.sort_by_key(|e| e.start);
        debug!("Found {} entities", entities.len());
        Ok(entities)
    }

    /// Run one fixed prediction. Failures are logged, never returned.
    pub fn warm_up(&self) {
        let labels: Vec<String> = WARM_UP_LABELS.iter().map(|l| l.to_string()).collect();
        match self.predict(WARM_UP_TEXT, &labels) {
            Ok(found) => info!(
                "Model warm-up completed successfully. Found {} entities.",
                found.len()
            ),
            Err(e) => warn!("Model warm-up failed: {}", e),
        }
    }

    fn normalize(&self, record: &Map<String, Value>) -> anyhow::Result<Entity> {
        let label = coerce_string(record, "label");
        Ok(Entity {
            text: coerce_string(record, "text"),
            label: self.label_map.remap(&label).to_string(),
            start: coerce_int(record, "start", 0)?,
            end: coerce_int(record, "end", 0)?,
            score: coerce_float(record, "score", 1.0)?,
        })
    }
}

fn coerce_string(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn coerce_int(record: &Map<String, Value>, key: &str, default: i64) -> anyhow::Result<i64> {
    // An explicit null is a type error, only an absent key takes the default.
    let Some(value) = record.get(key) else {
        return Ok(default);
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| anyhow!("field `{}` is out of integer range: {}", key, n)),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| anyhow!("field `{}` is not an integer: {:?}", key, s)),
        other => bail!("field `{}` is not an integer: {}", key, other),
    }
}

fn coerce_float(record: &Map<String, Value>, key: &str, default: f64) -> anyhow::Result<f64> {
    let Some(value) = record.get(key) else {
        return Ok(default);
    };
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("field `{}` is not a float: {}", key, n)),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| anyhow!("field `{}` is not a float: {:?}", key, s)),
        other => bail!("field `{}` is not a float: {}", key, other),
    }
}
