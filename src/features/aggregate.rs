//! Merge per-domain vectors and enforce the model's schema at the boundary.

use super::{FeatureSchema, FeatureVector};
use crate::error::{TrustError, TrustResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Merged features for one identity. The identity is metadata, never a model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedFeatures {
    pub identity_id: String,
    pub features: FeatureVector,
}

impl AggregatedFeatures {
    /// Values in schema order. Any key drift is a `SchemaMismatch`.
    pub fn ordered_values(&self, schema: &FeatureSchema) -> TrustResult<Array1<f64>> {
        check_schema(&self.features, schema)?;
        Ok(schema
            .names()
            .iter()
            .map(|n| self.features.get_f64(n).unwrap_or_default())
            .collect())
    }
}

fn check_schema(features: &FeatureVector, schema: &FeatureSchema) -> TrustResult<()> {
    let expected: BTreeSet<&str> = schema.names().iter().map(String::as_str).collect();
    let found: BTreeSet<&str> = features.keys().collect();
    if expected == found && expected.len() == schema.len() {
        return Ok(());
    }
    Err(TrustError::SchemaMismatch {
        missing: expected.difference(&found).map(|s| s.to_string()).collect(),
        unexpected: found.difference(&expected).map(|s| s.to_string()).collect(),
    })
}

/// Key-union of the three extractor outputs, checked against `schema`.
///
/// A key emitted by two extractors is reported as unexpected rather than overwritten.
pub fn aggregate(
    identity_id: impl Into<String>,
    device: &FeatureVector,
    keystroke: &FeatureVector,
    mouse: &FeatureVector,
    schema: &FeatureSchema,
) -> TrustResult<AggregatedFeatures> {
    let mut merged = FeatureVector::new();
    let mut duplicated = Vec::new();
    for (name, value) in device.iter().chain(keystroke.iter()).chain(mouse.iter()) {
        if merged.insert(name, value).is_some() {
            duplicated.push(name.to_string());
        }
    }
    if !duplicated.is_empty() {
        return Err(TrustError::SchemaMismatch {
            missing: Vec::new(),
            unexpected: duplicated,
        });
    }
    check_schema(&merged, schema)?;
    Ok(AggregatedFeatures {
        identity_id: identity_id.into(),
        features: merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureValue, DEVICE_FEATURES, KEYSTROKE_FEATURES, MOUSE_FEATURES};

    fn filled(names: &[&str], v: f64) -> FeatureVector {
        names.iter().map(|n| (*n, FeatureValue::Float(v))).collect()
    }

    #[test]
    fn test_aggregate_matches_behavioral_schema() {
        let schema = FeatureSchema::behavioral();
        let agg = aggregate(
            "user-1",
            &filled(&DEVICE_FEATURES, 1.0),
            &filled(&KEYSTROKE_FEATURES, 2.0),
            &filled(&MOUSE_FEATURES, 3.0),
            &schema,
        )
        .unwrap();
        assert_eq!(agg.identity_id, "user-1");
        assert!(!agg.features.contains("identity_id"));
        let values = agg.ordered_values(&schema).unwrap();
        assert_eq!(values.len(), 20);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[6], 2.0);
        assert_eq!(values[19], 3.0);
    }

    #[test]
    fn test_missing_mouse_features_is_mismatch() {
        let schema = FeatureSchema::behavioral();
        let err = aggregate(
            "u",
            &filled(&DEVICE_FEATURES, 0.0),
            &filled(&KEYSTROKE_FEATURES, 0.0),
            &FeatureVector::new(),
            &schema,
        )
        .unwrap_err();
        match err {
            TrustError::SchemaMismatch { missing, unexpected } => {
                assert_eq!(missing.len(), MOUSE_FEATURES.len());
                assert!(unexpected.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_extra_and_duplicate_keys_rejected() {
        let schema = FeatureSchema::new(["a", "b"]);
        let a = filled(&["a"], 1.0);
        let b = filled(&["b", "c"], 1.0);
        assert!(matches!(
            aggregate("u", &a, &b, &FeatureVector::new(), &schema),
            Err(TrustError::SchemaMismatch { unexpected, .. }) if unexpected == vec!["c".to_string()]
        ));
        assert!(matches!(
            aggregate("u", &a, &filled(&["a", "b"], 2.0), &FeatureVector::new(), &schema),
            Err(TrustError::SchemaMismatch { unexpected, .. }) if unexpected == vec!["a".to_string()]
        ));
    }

    #[test]
    fn test_ordered_values_follow_schema_not_key_order() {
        let schema = FeatureSchema::new(["zeta", "alpha"]);
        let agg = aggregate(
            "u",
            &[("alpha", 1.0)].into_iter().collect(),
            &[("zeta", 9.0)].into_iter().collect(),
            &FeatureVector::new(),
            &schema,
        )
        .unwrap();
        assert_eq!(agg.ordered_values(&schema).unwrap().to_vec(), vec![9.0, 1.0]);
    }
}
