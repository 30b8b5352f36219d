//! The capability a pretrained model must offer to be served.

use std::sync::Arc;

use serde_json::Value;

/// Zero-shot or fixed-vocabulary entity extraction.
///
/// Each returned record is expected to be an object with `text`, `label`,
/// `start`, `end` and `score` fields. Records are left untyped here; the
/// adapter in [`crate::NerModel`] coerces them and drops anything that is
/// not an object.
///
/// Implementations are called concurrently from the blocking thread pool
/// and must not rely on exclusive access.
pub trait EntityPredictor: Send + Sync {
    fn predict_entities(&self, text: &str, labels: &[String]) -> anyhow::Result<Vec<Value>>;
}

impl<P: EntityPredictor + ?Sized> EntityPredictor for Arc<P> {
    fn predict_entities(&self, text: &str, labels: &[String]) -> anyhow::Result<Vec<Value>> {
        (**self).predict_entities(text, labels)
    }
}

impl<P: EntityPredictor + ?Sized> EntityPredictor for Box<P> {
    fn predict_entities(&self, text: &str, labels: &[String]) -> anyhow::Result<Vec<Value>> {
        (**self).predict_entities(text, labels)
    }
}
