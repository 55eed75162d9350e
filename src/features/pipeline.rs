//! Feature pipeline: request → device/keystroke/pointer extractors → aggregated vector.

use super::{aggregate, AggregatedFeatures, DeviceFeatureExtractor, FeatureSchema, KeystrokeExtractor, MouseExtractor, MOUSE_FEATURES};
use crate::config::TrustConfig;
use crate::error::{TrustError, TrustResult};
use crate::network::IpRangeIndex;
use crate::telemetry::AssessmentRequest;
use std::sync::Arc;
use tracing::warn;

pub struct FeaturePipeline {
    index: Arc<IpRangeIndex>,
    device: DeviceFeatureExtractor,
    keystroke: KeystrokeExtractor,
    mouse: MouseExtractor,
}

impl FeaturePipeline {
    pub fn new(index: Arc<IpRangeIndex>, config: &TrustConfig) -> Self {
        Self {
            index,
            device: DeviceFeatureExtractor::new(&config.device),
            keystroke: KeystrokeExtractor::new(&config.keystroke),
            mouse: MouseExtractor::new(),
        }
    }

    pub fn index(&self) -> &IpRangeIndex {
        &self.index
    }

    /// Extract and aggregate against `schema`. Pointer-less sessions are `InsufficientData`
    /// when the schema needs pointer features.
    pub fn extract(&self, request: &AssessmentRequest, schema: &FeatureSchema) -> TrustResult<AggregatedFeatures> {
        let mouse = self.mouse.extract(&request.events, false);
        if mouse.is_empty() && MOUSE_FEATURES.iter().any(|n| schema.contains(n)) {
            return Err(TrustError::InsufficientData(format!(
                "identity {} has no pointer events",
                request.identity_id
            )));
        }
        let device = self.device.extract(&request.ip, &request.user_agent, &self.index);
        let keystroke = self.keystroke.extract(&request.events);
        aggregate(request.identity_id.as_str(), &device, &keystroke, &mouse, schema)
    }

    /// Training corpus from presumed-normal sessions. Sessions with too little data are skipped.
    pub fn corpus(&self, requests: &[AssessmentRequest], schema: &FeatureSchema) -> TrustResult<Vec<AggregatedFeatures>> {
        let mut out = Vec::with_capacity(requests.len());
        let mut skipped = 0usize;
        for r in requests {
            match self.extract(r, schema) {
                Ok(f) => out.push(f),
                Err(e) if e.is_degradable() => skipped += 1,
                Err(e) => return Err(e),
            }
        }
        if skipped > 0 {
            warn!(skipped, kept = out.len(), "sessions without enough telemetry left out of corpus");
        }
        Ok(out)
    }
}
