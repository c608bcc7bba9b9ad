//! Combines reconstruction-error and outlier-score detectors into one score per row.

use super::{AnomalyScore, ThresholdPolicy};
use crate::features::FeatureVector;
use crate::model::LazyDetector;
use std::sync::Arc;

/// Spread below which a batch is treated as constant
pub const NEAR_CONSTANT: f64 = 1e-8;

const WEIGHT: f64 = 0.5;

/// Min-max scale to [0, 1] over the batch; near-constant input maps to all zeros.
pub fn min_max_normalize(raw: &[f64]) -> Vec<f64> {
    let Some(lo) = raw.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let hi = raw.iter().copied().fold(lo, f64::max);
    let span = hi - lo;
    if span < NEAR_CONSTANT {
        return vec![0.0; raw.len()];
    }
    raw.iter().map(|x| ((x - lo) / span).clamp(0.0, 1.0)).collect()
}

/// Equal-weight combination of two normalized vectors of the same length.
pub fn combine(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| WEIGHT * x + WEIGHT * y).collect()
}

/// Quantile with linear interpolation between closest ranks. `None` for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn threshold(combined: &[f64], policy: ThresholdPolicy) -> f64 {
    match policy {
        ThresholdPolicy::Fixed { threshold } => threshold,
        // A flat batch sits at its own quantile, so every row is flagged
        ThresholdPolicy::Adaptive { quantile: q } => quantile(combined, q).unwrap_or(f64::INFINITY),
    }
}

/// Stateless per call; share it across requests behind an `Arc`.
pub struct EnsembleScorer {
    reconstruction: Arc<LazyDetector>,
    outlier: Arc<LazyDetector>,
}

impl EnsembleScorer {
    pub fn new(reconstruction: Arc<LazyDetector>, outlier: Arc<LazyDetector>) -> Self {
        Self {
            reconstruction,
            outlier,
        }
    }

    /// Raw scores from one detector, or zeros when it cannot contribute.
    fn contribution(detector: &LazyDetector, frame: &[FeatureVector]) -> Vec<f64> {
        match detector.handle().raw_scores(frame) {
            Ok(scores) => scores,
            Err(crate::error::DetectorError::Unavailable(_)) => vec![0.0; frame.len()],
            Err(e) => {
                tracing::warn!(detector = %detector.name(), error = %e, rows = frame.len(), "detector failed; contributes zero");
                vec![0.0; frame.len()]
            }
        }
    }

    /// Combined scores before thresholding, in input order.
    pub fn combined(&self, frame: &[FeatureVector]) -> Vec<f64> {
        if frame.is_empty() {
            return Vec::new();
        }
        let a = min_max_normalize(&Self::contribution(&self.reconstruction, frame));
        let b = min_max_normalize(&Self::contribution(&self.outlier, frame));
        combine(&a, &b)
    }

    /// One score per row, same order as `frame`.
    pub fn score(&self, frame: &[FeatureVector], policy: ThresholdPolicy) -> Vec<AnomalyScore> {
        let combined = self.combined(frame);
        let t = threshold(&combined, policy);
        let scores: Vec<AnomalyScore> = frame
            .iter()
            .zip(combined)
            .map(|(fv, score)| AnomalyScore {
                timestamp: fv.timestamp,
                score,
                is_anomaly: score >= t,
            })
            .collect();
        tracing::debug!(
            rows = scores.len(),
            threshold = t,
            flagged = scores.iter().filter(|s| s.is_anomaly).count(),
            "ensemble scored"
        );
        scores
    }
}
