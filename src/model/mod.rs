//! Outlier models: normalization, detectors and the trained-model artefact.
//!
//! The pipeline only depends on [`OutlierDetector`]; any unsupervised detector
//! that can rate a normalized sample can be plugged in.

mod isolation;
#[cfg(feature = "onnx")]
mod onnx;
mod scaler;
mod trained;

pub use isolation::{IsolationForest, IsolationForestParams};
#[cfg(feature = "onnx")]
pub use onnx::OnnxDetector;
pub use scaler::StandardScaler;
pub use trained::TrainedModel;

use crate::error::TrustResult;
use ndarray::{ArrayView1, ArrayView2};

/// Scoring side of a fitted outlier model.
pub trait OutlierDetector: Send + Sync {
    fn n_features(&self) -> usize;

    /// Continuous score; negative means outlier, more negative is more anomalous.
    fn decision_function(&self, sample: ArrayView1<'_, f64>) -> TrustResult<f64>;

    /// `1` for inliers, `-1` for outliers.
    fn predict(&self, sample: ArrayView1<'_, f64>) -> TrustResult<i8> {
        Ok(if self.decision_function(sample)? >= 0.0 { 1 } else { -1 })
    }
}

/// Training side: build a detector from a matrix of normalized samples (rows).
pub trait FitOutlier: OutlierDetector + Sized {
    type Params;

    fn fit(data: ArrayView2<'_, f64>, params: &Self::Params) -> TrustResult<Self>;
}
