//! Trust service: extraction, aggregation and scoring behind one handle.
//! Index and model are built once and shared read-only by every worker.

use super::{ScoringEngine, Verdict};
use crate::config::TrustConfig;
use crate::error::{TrustError, TrustResult};
use crate::features::{AggregatedFeatures, FeaturePipeline, FeatureSchema};
use crate::model::{IsolationForest, OutlierDetector, TrainedModel};
use crate::network::IpRangeIndex;
use crate::telemetry::AssessmentRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustReport {
    pub report_id: Uuid,
    pub identity_id: String,
    pub verdict: Verdict,
    pub anomaly_score: f64,
    /// Unix millis
    pub scored_at: i64,
}

pub struct TrustService<D = IsolationForest> {
    features: FeaturePipeline,
    model: Arc<TrainedModel<D>>,
    engine: ScoringEngine,
    max_concurrency: usize,
}

impl TrustService<IsolationForest> {
    /// Loads ranges and the model artefact named in `config`. Missing files abort construction.
    pub fn from_config(config: &TrustConfig) -> TrustResult<Self> {
        config.validate()?;
        let index = IpRangeIndex::from_files(&config.ranges.asn_path, &config.ranges.country_path)?;
        let model = TrainedModel::load(&config.model_path)?;
        Ok(Self::new(Arc::new(index), Arc::new(model), config))
    }
}

impl<D: OutlierDetector> TrustService<D> {
    pub fn new(index: Arc<IpRangeIndex>, model: Arc<TrainedModel<D>>, config: &TrustConfig) -> Self {
        Self {
            features: FeaturePipeline::new(index, config),
            model,
            engine: ScoringEngine::new(),
            max_concurrency: config.workers.max_concurrency.max(1),
        }
    }

    pub fn model(&self) -> &TrainedModel<D> {
        &self.model
    }

    /// Aggregated vector against the model's schema.
    pub fn features(&self, request: &AssessmentRequest) -> TrustResult<AggregatedFeatures> {
        self.features.extract(request, self.model.schema())
    }

    pub fn assess(&self, request: &AssessmentRequest) -> TrustResult<TrustReport> {
        let features = self.features(request)?;
        let result = self.engine.score(&features, &self.model)?;
        if result.verdict == Verdict::Anomaly {
            info!(
                identity_id = %request.identity_id,
                anomaly_score = result.anomaly_score,
                "anomalous session"
            );
        }
        Ok(TrustReport {
            report_id: Uuid::new_v4(),
            identity_id: features.identity_id,
            verdict: result.verdict,
            anomaly_score: result.anomaly_score,
            scored_at: chrono::Utc::now().timestamp_millis(),
        })
    }
}

impl<D: OutlierDetector + 'static> TrustService<D> {
    /// Scores every request on the blocking pool. Results come back in input order;
    /// one failure never affects the others.
    pub async fn assess_batch(self: Arc<Self>, requests: Vec<AssessmentRequest>) -> Vec<TrustResult<TrustReport>> {
        let total = requests.len();
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut set = JoinSet::new();

        for (i, request) in requests.into_iter().enumerate() {
            let service = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(p) => p,
                    Err(e) => return (i, Err(TrustError::Worker(e.to_string()))),
                };
                let outcome = tokio::task::spawn_blocking(move || service.assess(&request))
                    .await
                    .unwrap_or_else(|e| Err(TrustError::Worker(e.to_string())));
                (i, outcome)
            });
        }

        let mut slots: Vec<Option<TrustResult<TrustReport>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((i, outcome)) => slots[i] = Some(outcome),
                Err(e) => warn!(error = %e, "assessment task aborted"),
            }
        }

        let results: Vec<_> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(TrustError::Worker("assessment task lost".into()))))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total, failed, "batch assessed");
        results
    }
}

/// Training corpus over the full behavioral schema. Sessions without pointer data are skipped.
pub fn behavioral_corpus(
    index: Arc<IpRangeIndex>,
    config: &TrustConfig,
    requests: &[AssessmentRequest],
) -> TrustResult<Vec<AggregatedFeatures>> {
    FeaturePipeline::new(index, config).corpus(requests, &FeatureSchema::behavioral())
}
