//! Named entity recognition for entex.
//!
//! [`NerModel`] owns a loaded model and turns its raw output into sorted,
//! label-normalized [`Entity`] records. The model itself sits behind the
//! [`EntityPredictor`] trait; the shipped implementation is
//! [`BertTokenClassifier`], a Candle BERT token classifier pulled from the
//! Hugging Face Hub.

mod bert;
mod label_map;
mod model;
mod predictor;

pub use bert::{BertTokenClassifier, NativeSpan};
pub use label_map::LabelMap;
pub use model::{Entity, NerModel, WARM_UP_LABELS, WARM_UP_TEXT};
pub use predictor::EntityPredictor;

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("Failed to load model {model_id}: {source}")]
    ModelLoad {
        model_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Prediction failed: {source}")]
    Prediction {
        #[source]
        source: anyhow::Error,
    },
}

impl NerError {
    pub fn model_load(model_id: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        NerError::ModelLoad {
            model_id: model_id.into(),
            source: source.into(),
        }
    }

    pub fn prediction(source: impl Into<anyhow::Error>) -> Self {
        NerError::Prediction {
            source: source.into(),
        }
    }
}
