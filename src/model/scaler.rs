//! Per-feature standardization fitted on the training corpus.

use crate::error::{TrustError, TrustResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Population statistics per column. Constant columns get scale 1.
    pub fn fit(data: ArrayView2<'_, f64>) -> TrustResult<Self> {
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| TrustError::InputMalformed("cannot fit scaler on empty corpus".into()))?;
        let std = data.std_axis(Axis(0), 0.0);
        let scale = std
            .iter()
            .map(|&s| if s.is_finite() && s > 10.0 * f64::EPSILON { s } else { 1.0 })
            .collect();
        Ok(Self {
            mean: mean.to_vec(),
            scale,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform(&self, sample: ArrayView1<'_, f64>) -> TrustResult<Array1<f64>> {
        if sample.len() != self.n_features() {
            return Err(TrustError::InputMalformed(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                sample.len()
            )));
        }
        Ok(sample
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn transform_rows(&self, data: ArrayView2<'_, f64>) -> TrustResult<Array2<f64>> {
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            let scaled = self.transform(row.view())?;
            row.assign(&scaled);
        }
        Ok(out)
    }
}
