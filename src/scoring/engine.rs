//! Runs an aggregated vector through a trained model and produces a verdict.

use crate::error::{TrustError, TrustResult};
use crate::features::AggregatedFeatures;
use crate::model::{OutlierDetector, TrainedModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Normal,
    Anomaly,
}

impl Verdict {
    /// Detector label `1` is an inlier; anything else is an anomaly.
    pub fn from_label(label: i8) -> Self {
        if label == 1 {
            Verdict::Normal
        } else {
            Verdict::Anomaly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Normal => "NORMAL",
            Verdict::Anomaly => "ANOMALY",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub verdict: Verdict,
    /// Detector's decision value, sign preserved: more negative is more anomalous.
    pub anomaly_score: f64,
}

/// Anything a detector reports surfaces as `Scoring`, with the original error kept as its source.
fn detector_failure(context: &str, err: TrustError) -> TrustError {
    match err {
        TrustError::Scoring { .. } => err,
        other => TrustError::scoring_with(context, other),
    }
}

/// Stateless; one instance can serve any number of models and threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of `(features, model)`. Detector failures are not retried.
    pub fn score<D: OutlierDetector>(
        &self,
        features: &AggregatedFeatures,
        model: &TrainedModel<D>,
    ) -> TrustResult<ScoreResult> {
        let x = model.normalize(features)?;
        let label = model
            .detector()
            .predict(x.view())
            .map_err(|e| detector_failure("detector predict", e))?;
        let anomaly_score = model
            .detector()
            .decision_function(x.view())
            .map_err(|e| detector_failure("detector decision function", e))?;
        if !anomaly_score.is_finite() {
            return Err(TrustError::scoring(format!(
                "non-finite anomaly score {anomaly_score} for {}",
                features.identity_id
            )));
        }
        let verdict = Verdict::from_label(label);
        debug!(identity_id = %features.identity_id, %verdict, anomaly_score, "scored");
        Ok(ScoreResult {
            verdict,
            anomaly_score,
        })
    }
}
