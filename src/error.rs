//! Error taxonomy for the scoring pipeline.

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TrustError {
    /// Unparseable input with no safe default (e.g. a training row).
    #[error("malformed input: {0}")]
    InputMalformed(String),

    /// Session carries too little telemetry to produce a feature vector.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Feature keys do not match the schema recorded in the trained model.
    #[error("schema mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// The wrapped outlier model failed.
    #[error("scoring failed: {context}")]
    Scoring {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Range file or model artefact absent or unreadable.
    #[error("resource missing: {}", path.display())]
    ResourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model artefact present but unusable (checksum, version).
    #[error("invalid model artifact: {0}")]
    Artifact(String),

    #[error("config error: {0}")]
    Config(String),

    /// A batch worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TrustResult<T> = std::result::Result<T, TrustError>;

impl TrustError {
    pub fn scoring(context: impl Into<String>) -> Self {
        Self::Scoring {
            context: context.into(),
            source: None,
        }
    }

    pub fn scoring_with(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Scoring {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn resource_missing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceMissing {
            path: path.into(),
            source,
        }
    }

    /// Caller must stop: nothing can be salvaged from this request or resource.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaMismatch { .. }
                | Self::Scoring { .. }
                | Self::ResourceMissing { .. }
                | Self::Artifact(_)
                | Self::Config(_)
        )
    }

    /// Per-request problem; the rest of a batch is unaffected.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::InputMalformed(_) | Self::InsufficientData(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_schema_mismatch_display() {
        let err = TrustError::SchemaMismatch {
            missing: vec!["straightness".into()],
            unexpected: vec![],
        };
        assert!(err.to_string().contains("straightness"));
        assert!(err.is_fatal());
        assert!(!err.is_degradable());
    }

    #[test]
    fn test_scoring_preserves_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "tensor shape");
        let err = TrustError::scoring_with("onnx run", io);
        assert_eq!(err.to_string(), "scoring failed: onnx run");
        assert!(err.source().unwrap().to_string().contains("tensor shape"));
    }

    #[test]
    fn test_insufficient_data_is_degradable() {
        let err = TrustError::InsufficientData("no pointer events".into());
        assert!(err.is_degradable());
        assert!(!err.is_fatal());
    }
}
