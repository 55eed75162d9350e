//! Behavioral trust scoring for identity-verification sessions.
//!
//! Modular structure:
//! - [`telemetry`]: Interaction events, sessions and raw pointer records
//! - [`network`]: IP range index (ASN + country) and organization classification
//! - [`features`]: Device, keystroke and pointer feature extraction and aggregation
//! - [`model`]: Scaler, outlier detectors and the persisted model artefact
//! - [`scoring`]: Verdicts and the batch-capable trust service
//! - [`synthetic`]: Seeded genuine/bot session generators
//! - [`logging`]: Structured logging and NDJSON result lines

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod network;
pub mod scoring;
pub mod synthetic;
pub mod telemetry;

pub use config::TrustConfig;
pub use error::{TrustError, TrustResult};
pub use features::{AggregatedFeatures, FeaturePipeline, FeatureSchema, FeatureValue, FeatureVector};
pub use logging::StructuredLogger;
pub use model::{IsolationForest, OutlierDetector, TrainedModel};
pub use network::{IpInfo, IpRangeIndex, IpType};
pub use scoring::{ScoreResult, ScoringEngine, TrustReport, TrustService, Verdict};
pub use telemetry::{AssessmentRequest, Event, EventKind, Session};
