//! Pipeline configuration. Signature lists and watch-lists live here, not in the extractors.

use crate::error::{TrustError, TrustResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// IP range datasets
    pub ranges: RangesConfig,
    /// Path to the trained model artefact
    pub model_path: PathBuf,
    pub device: DeviceConfig,
    pub keystroke: KeystrokeConfig,
    /// Isolation forest parameters used when training
    pub training: TrainingConfig,
    pub workers: WorkerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangesConfig {
    /// Rows: ip_start, ip_end, asn, organization
    pub asn_path: PathBuf,
    /// Rows: ip_start, ip_end, country_code
    pub country_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// ISO country codes flagged by `is_from_suspicious_country`
    pub suspicious_countries: Vec<String>,
    /// Lowercase user-agent fragments of unsupported operating systems
    pub outdated_os_signatures: Vec<String>,
    /// Lowercase user-agent fragments of automation browsers
    pub headless_signatures: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystrokeConfig {
    /// Key label counted as a correction
    pub backspace_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub n_trees: usize,
    /// Subsample size per tree (capped at corpus size)
    pub max_samples: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Upper bound on sessions scored concurrently by `assess_batch`
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            ranges: RangesConfig::default(),
            model_path: PathBuf::from("models/behavioral_model.json"),
            device: DeviceConfig::default(),
            keystroke: KeystrokeConfig::default(),
            training: TrainingConfig::default(),
            workers: WorkerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            asn_path: PathBuf::from("models/asn-ipv4.csv"),
            country_path: PathBuf::from("models/geo-whois-asn-country-ipv4.csv"),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            suspicious_countries: vec!["CN".into(), "RU".into(), "IR".into()],
            outdated_os_signatures: vec!["windows nt 6.1".into()],
            headless_signatures: vec!["headless".into(), "puppeteer".into()],
        }
    }
}

impl Default for KeystrokeConfig {
    fn default() -> Self {
        Self {
            backspace_key: "BACKSPACE".to_string(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl TrustConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<TrustConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "config unparseable; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "config unreadable; using defaults")
                }
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> TrustResult<()> {
        if self.keystroke.backspace_key.trim().is_empty() {
            return Err(TrustError::Config("keystroke.backspace_key must not be empty".into()));
        }
        if self.training.n_trees == 0 {
            return Err(TrustError::Config("training.n_trees must be > 0".into()));
        }
        if self.training.max_samples < 2 {
            return Err(TrustError::Config(format!(
                "training.max_samples must be >= 2, got {}",
                self.training.max_samples
            )));
        }
        if self.workers.max_concurrency == 0 {
            return Err(TrustError::Config("workers.max_concurrency must be > 0".into()));
        }
        Ok(())
    }
}
