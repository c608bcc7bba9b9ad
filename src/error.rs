//! Error taxonomy. Only [`ValidationError`] ever reaches a caller; the rest
//! describe degraded states that the pipeline absorbs and logs.

use thiserror::Error;

/// Malformed apply/dismiss request. The request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("building_id is required")]
    MissingBuildingId,
    #[error("suggestion id is required")]
    MissingSuggestionId,
}

/// A detector could not contribute scores for a batch.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("detector returned {got} scores for {expected} rows")]
    LengthMismatch { expected: usize, got: usize },
    #[error("detector returned a non-finite score at row {0}")]
    NonFinite(usize),
}

/// A single suggestion analyzer could not run over the window.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzerError {
    #[error("metric `{0}` missing from every sample")]
    MissingMetric(&'static str),
}

/// Telemetry source failure (outside the core; the binary logs and skips the cycle).
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
