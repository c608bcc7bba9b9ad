//! Anomaly ensemble: two detectors → normalized, equally weighted score → threshold.

mod ensemble;

pub use ensemble::{combine, min_max_normalize, quantile, EnsembleScorer, NEAR_CONSTANT};
pub use crate::config::ThresholdPolicy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ensemble result for one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn from_score(score: f64, critical_score: f64) -> Self {
        if score >= critical_score {
            Severity::Critical
        } else {
            Severity::Warning
        }
    }
}
