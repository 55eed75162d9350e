//! ONNX Runtime detector for outlier models exported from other toolchains.
//! Input: [1, n_features] f32. Outputs: `label` (i64, optional) and `scores` (f32).

use super::OutlierDetector;
use crate::error::{TrustError, TrustResult};
use ndarray::{Array2, ArrayView1, CowArray};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, GraphOptimizationLevel, OrtError, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::{Arc, OnceLock};

static ORT_ENV: OnceLock<Arc<Environment>> = OnceLock::new();

fn ort_err(context: &str, e: OrtError) -> TrustError {
    TrustError::scoring_with(context, std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

fn environment() -> TrustResult<Arc<Environment>> {
    if let Some(env) = ORT_ENV.get() {
        return Ok(Arc::clone(env));
    }
    let env = Environment::builder()
        .with_name("trust-scoring")
        .build()
        .map_err(|e| ort_err("ORT environment", e))?
        .into_arc();
    Ok(Arc::clone(ORT_ENV.get_or_init(|| env)))
}

pub struct OnnxDetector {
    session: Session,
    n_features: usize,
    score_output: usize,
    label_output: Option<usize>,
}

impl OnnxDetector {
    /// Unlike the in-crate forest, a missing artefact is an error: there is no no-op mode.
    pub fn load(path: &Path, n_features: usize) -> TrustResult<Self> {
        if !path.exists() {
            return Err(TrustError::resource_missing(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "ONNX model not found"),
            ));
        }
        let env = environment()?;
        let session = SessionBuilder::new(&env)
            .map_err(|e| ort_err("session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(|e| ort_err("session options", e))?
            .with_model_from_file(path)
            .map_err(|e| ort_err("model load", e))?;

        let score_output = session
            .outputs
            .iter()
            .position(|o| o.name == "scores")
            .unwrap_or(session.outputs.len().saturating_sub(1));
        let label_output = session.outputs.iter().position(|o| o.name == "label");
        tracing::info!(path = %path.display(), n_features, "ONNX detector loaded");

        Ok(Self {
            session,
            n_features,
            score_output,
            label_output,
        })
    }

    fn infer(&self, sample: ArrayView1<'_, f64>) -> TrustResult<(Option<i64>, f32)> {
        if sample.len() != self.n_features {
            return Err(TrustError::scoring(format!(
                "ONNX detector expects {} features, got {}",
                self.n_features,
                sample.len()
            )));
        }
        let arr = Array2::from_shape_vec((1, self.n_features), sample.iter().map(|v| *v as f32).collect())
            .map_err(|e| TrustError::scoring_with("input shape", e))?;
        let input = CowArray::from(arr.into_dyn());
        let value = Value::from_array(self.session.allocator(), &input).map_err(|e| ort_err("input tensor", e))?;
        let outputs = self.session.run(vec![value]).map_err(|e| ort_err("session run", e))?;

        let scores: OrtOwnedTensor<f32, _> = outputs
            .get(self.score_output)
            .ok_or_else(|| TrustError::scoring("model produced no score output"))?
            .try_extract()
            .map_err(|e| ort_err("score output", e))?;
        let score = scores
            .view()
            .iter()
            .next()
            .copied()
            .ok_or_else(|| TrustError::scoring("empty score tensor"))?;

        let label = match self.label_output.and_then(|i| outputs.get(i)) {
            Some(out) => {
                let labels: OrtOwnedTensor<i64, _> = out.try_extract().map_err(|e| ort_err("label output", e))?;
                let first = labels.view().iter().next().copied();
                first
            }
            None => None,
        };
        Ok((label, score))
    }
}

impl OutlierDetector for OnnxDetector {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn decision_function(&self, sample: ArrayView1<'_, f64>) -> TrustResult<f64> {
        let (_, score) = self.infer(sample)?;
        Ok(score as f64)
    }

    fn predict(&self, sample: ArrayView1<'_, f64>) -> TrustResult<i8> {
        match self.infer(sample)? {
            (Some(label), _) => Ok(if label == 1 { 1 } else { -1 }),
            (None, score) => Ok(if score >= 0.0 { 1 } else { -1 }),
        }
    }
}
