//! Feature extraction from telemetry and network context.
//!
//! Each extractor emits a [`FeatureVector`] with a fixed key set. The
//! aggregator merges them and checks the result against the [`FeatureSchema`]
//! a model was trained with.

mod aggregate;
mod device;
mod keystroke;
mod mouse;
mod pipeline;

pub use aggregate::{aggregate, AggregatedFeatures};
pub use device::{DeviceFeatureExtractor, DEVICE_FEATURES};
pub use keystroke::{KeystrokeExtractor, KEYSTROKE_FEATURES};
pub use mouse::{MouseExtractor, MOUSE_FEATURES};
pub use pipeline::FeaturePipeline;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Int(v) => v as f64,
            FeatureValue::Float(v) => v,
        }
    }

    pub fn flag(on: bool) -> Self {
        FeatureValue::Int(on as i64)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

/// Named feature values. Ordered map, so iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous value if the key was already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Option<FeatureValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.values.get(name).copied()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// An empty vector means "insufficient data", not a vector of zeros.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fv = FeatureVector::new();
        for (k, v) in iter {
            fv.insert(k, v);
        }
        fv
    }
}

/// Ordered feature names a model expects. Order defines the model's input columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Device, keystroke and pointer features, in that order.
    pub fn behavioral() -> Self {
        Self::new(
            DEVICE_FEATURES
                .iter()
                .chain(KEYSTROKE_FEATURES.iter())
                .chain(MOUSE_FEATURES.iter())
                .copied(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Seconds between two millisecond timestamps. Widened so any pair of `i64` values is safe.
pub(crate) fn span_seconds(first_ms: i64, last_ms: i64) -> f64 {
    (i128::from(last_ms) - i128::from(first_ms)) as f64 / 1000.0
}

/// 4-decimal rounding applied to every float feature.
pub(crate) fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
