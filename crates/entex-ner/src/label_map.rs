//! Translation from the model's native label vocabulary to public labels.

use std::collections::HashMap;

/// Exact, case-sensitive label synonyms. Labels without an entry pass
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    entries: HashMap<String, String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::from_pairs([
            ("PERSON", "person"),
            ("DATE", "date"),
            ("ORG", "teams"),
            ("AWARD", "award"),
            ("COMPETITION", "competitions"),
        ])
    }
}

impl LabelMap {
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn remap<'a>(&'a self, label: &'a str) -> &'a str {
        self.entries.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
