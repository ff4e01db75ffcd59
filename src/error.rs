// src/error.rs
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChordError {
    #[error("empty chord label")]
    EmptyLabel,
    #[error("unknown chord root in label `{0}`")]
    UnknownRoot(String),
    #[error("unknown chord quality `{quality}` in label `{label}`")]
    UnknownQuality { label: String, quality: String },
    #[error("no playable voicing: {found} fretted note(s), need at least 3")]
    ShortVoicing { found: usize },
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classification timed out after {0:?}")]
    Timeout(Duration),
    #[error("classifier has no templates")]
    Empty,
    #[error("feature vector has {got} values, expected {expected}")]
    FeatureLength { expected: usize, got: usize },
    #[error("classifier failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
