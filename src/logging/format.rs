//! Result lines: one JSON object per assessment (ndjson) for downstream ingestion.

use crate::error::TrustError;
use crate::scoring::{TrustReport, Verdict};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct ReportLine<'a> {
    pub identity_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scored_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> ReportLine<'a> {
    pub fn from_report(report: &'a TrustReport) -> Self {
        Self {
            identity_id: &report.identity_id,
            report_id: Some(report.report_id.to_string()),
            verdict: Some(report.verdict),
            anomaly_score: Some(report.anomaly_score),
            scored_at: Some(report.scored_at),
            error: None,
        }
    }

    pub fn from_error(identity_id: &'a str, error: &TrustError) -> Self {
        Self {
            identity_id,
            report_id: None,
            verdict: None,
            anomaly_score: None,
            scored_at: None,
            error: Some(error.to_string()),
        }
    }
}

/// Emit a single line without going through tracing.
pub fn emit_json(line: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
    let encoded = serde_json::to_string(line)?;
    writeln!(w, "{}", encoded)
}
