//! trust-scorer: reads newline-delimited assessment requests on stdin and writes
//! one JSON result line per request to stdout.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use trust_scoring::{
    config::TrustConfig,
    logging::{emit_json, ReportLine, StructuredLogger},
    AssessmentRequest, TrustService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("TRUST_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = TrustConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), model = %config.model_path.display(), "trust scorer starting");

    let service = Arc::new(TrustService::from_config(&config)?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut requests = Vec::new();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AssessmentRequest>(&line) {
            Ok(r) => requests.push(r),
            Err(e) => warn!(line = line_no, error = %e, "skipping malformed request"),
        }
    }

    let ids: Vec<String> = requests.iter().map(|r| r.identity_id.clone()).collect();
    let results = service.assess_batch(requests).await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (id, result) in ids.iter().zip(&results) {
        let line = match result {
            Ok(report) => ReportLine::from_report(report),
            Err(e) => ReportLine::from_error(id, e),
        };
        emit_json(&line, &mut out)?;
    }
    info!(assessed = results.len(), "trust scorer done");
    Ok(())
}
