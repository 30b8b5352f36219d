//! Configuration loading for entex.
//!
//! Settings come from environment variables (keys are case-insensitive) and
//! fall back to the defaults below. The binary loads a `.env` file first, so
//! values placed there behave exactly like exported variables.

use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Reserved route prefix. Routing does not use it yet.
    #[serde(default = "default_api_v1_str")]
    pub api_v1_str: String,
    /// Hugging Face identifier of the token-classification model.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Not consulted by request handling; labels always come from the request.
    #[serde(default = "default_labels", deserialize_with = "deserialize_labels")]
    pub default_labels: Vec<String>,
    /// Not enforced on incoming text.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Not applied to predictions.
    #[serde(default = "default_min_confidence_score")]
    pub min_confidence_score: f64,
}

fn default_project_name() -> String { "GLiNER Entity Extraction API".to_string() }
fn default_version()      -> String { "1.0.0".to_string() }
fn default_api_v1_str()   -> String { "/api/v1".to_string() }
fn default_model_name()   -> String { "dslim/bert-base-NER".to_string() }
fn default_max_text_length()      -> usize { 10_000 }
fn default_min_confidence_score() -> f64   { 0.5 }

fn default_labels() -> Vec<String> {
    ["person", "award", "date", "competitions", "teams"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            version: default_version(),
            api_v1_str: default_api_v1_str(),
            model_name: default_model_name(),
            default_labels: default_labels(),
            max_text_length: default_max_text_length(),
            min_confidence_score: default_min_confidence_score(),
        }
    }
}

impl Settings {
    /// Build settings from the current process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::default())
    }

    /// Build settings from arbitrary key/value pairs instead of the process
    /// environment. Keys are case-insensitive and unknown keys are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(config::Environment::default().source(Some(vars)))
    }

    // Values stay strings and each field parses its own, so `VERSION=2.0`
    // is kept as "2.0" rather than read as a float.
    fn load(source: config::Environment) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelList {
    List(Vec<String>),
    Text(String),
}

/// `DEFAULT_LABELS` is either a JSON array of strings or a comma-separated
/// list. Entries are trimmed and empty ones dropped.
fn deserialize_labels<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = match LabelList::deserialize(deserializer)? {
        LabelList::List(labels) => labels,
        LabelList::Text(text) if text.trim_start().starts_with('[') => {
            serde_json::from_str(&text).map_err(serde::de::Error::custom)?
        }
        LabelList::Text(text) => text.split(',').map(String::from).collect(),
    };

    Ok(labels
        .into_iter()
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect())
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Process-wide settings, read from the environment on first use.
///
/// Every successful call returns the same instance. A failed read is not
/// cached, so the error surfaces again on the next call.
pub fn settings() -> Result<&'static Settings> {
    if let Some(settings) = SETTINGS.get() {
        return Ok(settings);
    }
    let loaded = Settings::from_env()?;
    Ok(SETTINGS.get_or_init(|| loaded))
}
