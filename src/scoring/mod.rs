//! Anomaly scoring: verdicts from a trained model, and the service that drives
//! whole requests through extraction and scoring.

mod engine;
mod service;

pub use engine::{ScoreResult, ScoringEngine, Verdict};
pub use service::{behavioral_corpus, TrustReport, TrustService};
