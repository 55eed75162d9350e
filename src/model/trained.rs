//! Trained model artefact: schema + scaler + detector, frozen after training.
//!
//! On disk it is a JSON envelope carrying a format version and the SHA-256 of
//! the serialized model, so a truncated or edited file is rejected on load.

use super::{FitOutlier, IsolationForest, OutlierDetector, StandardScaler};
use crate::error::{TrustError, TrustResult};
use crate::features::{AggregatedFeatures, FeatureSchema};
use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel<D = IsolationForest> {
    schema: FeatureSchema,
    scaler: StandardScaler,
    detector: D,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    checksum: String,
    payload: String,
}

fn checksum(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

impl<D: OutlierDetector> TrainedModel<D> {
    /// Assemble from independently produced parts (e.g. an imported ONNX detector).
    pub fn from_parts(schema: FeatureSchema, scaler: StandardScaler, detector: D) -> TrustResult<Self> {
        if scaler.n_features() != schema.len() || detector.n_features() != schema.len() {
            return Err(TrustError::Artifact(format!(
                "schema has {} features, scaler {}, detector {}",
                schema.len(),
                scaler.n_features(),
                detector.n_features()
            )));
        }
        Ok(Self {
            schema,
            scaler,
            detector,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Schema-ordered, standardized model input.
    pub fn normalize(&self, features: &AggregatedFeatures) -> TrustResult<Array1<f64>> {
        let raw = features.ordered_values(&self.schema)?;
        self.scaler.transform(raw.view())
    }
}

impl<D: FitOutlier> TrainedModel<D> {
    /// Fit scaler and detector on a corpus of presumed-normal feature vectors.
    pub fn train(schema: FeatureSchema, corpus: &[AggregatedFeatures], params: &D::Params) -> TrustResult<Self> {
        if corpus.is_empty() {
            return Err(TrustError::InputMalformed("training corpus is empty".into()));
        }
        let mut flat = Vec::with_capacity(corpus.len() * schema.len());
        for sample in corpus {
            flat.extend(sample.ordered_values(&schema)?.iter().copied());
        }
        let matrix = Array2::from_shape_vec((corpus.len(), schema.len()), flat)
            .map_err(|e| TrustError::InputMalformed(format!("training matrix: {e}")))?;

        let scaler = StandardScaler::fit(matrix.view())?;
        let scaled = scaler.transform_rows(matrix.view())?;
        let detector = D::fit(scaled.view(), params)?;
        info!(samples = corpus.len(), features = schema.len(), "model trained");
        Self::from_parts(schema, scaler, detector)
    }
}

impl<D> TrainedModel<D>
where
    D: OutlierDetector + Serialize + DeserializeOwned,
{
    /// Written to a uniquely named sibling temp file, then renamed into place,
    /// so concurrent saves never share a scratch file.
    pub fn save(&self, path: &Path) -> TrustResult<()> {
        let payload = serde_json::to_string(self)?;
        let envelope = Envelope {
            format_version: FORMAT_VERSION,
            checksum: checksum(&payload),
            payload,
        };
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir
            }
            None => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer(tmp.as_file_mut(), &envelope)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| TrustError::Io(e.error))?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }

    pub fn load(path: &Path) -> TrustResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| TrustError::resource_missing(path, e))?;
        let envelope: Envelope = serde_json::from_str(&data)
            .map_err(|e| TrustError::Artifact(format!("{}: {e}", path.display())))?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(TrustError::Artifact(format!(
                "unsupported format version {} (expected {})",
                envelope.format_version, FORMAT_VERSION
            )));
        }
        if checksum(&envelope.payload) != envelope.checksum {
            return Err(TrustError::Artifact(format!("{}: checksum mismatch", path.display())));
        }
        let model: Self = serde_json::from_str(&envelope.payload)?;
        let model = Self::from_parts(model.schema, model.scaler, model.detector)?;
        info!(path = %path.display(), features = model.schema.len(), "model loaded");
        Ok(model)
    }
}
