//! Aggregate indicators for a single result page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for one page of results (e.g. `cache_hit_rate`).
///
/// An empty snapshot is a valid answer meaning "no data for this page".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorsSnapshot {
    values: BTreeMap<String, serde_json::Value>,
}

impl IndicatorsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(serde_json::Value::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.values.iter()
    }
}

/// Body of the indicators endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorsResponse {
    #[serde(default)]
    pub indicators: IndicatorsSnapshot,
}
