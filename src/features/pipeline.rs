//! Frame building: time-ordered samples → one feature vector per sample.

use super::{CyclicalTime, FeatureVector};
use crate::telemetry::TelemetrySample;

fn finite_or_zero(v: Option<f64>) -> f32 {
    match v {
        Some(x) if x.is_finite() => x as f32,
        _ => 0.0,
    }
}

/// Build the frame for a batch of samples. Output is ordered by timestamp.
pub fn build_frame(samples: &[TelemetrySample]) -> Vec<FeatureVector> {
    let mut frame: Vec<FeatureVector> = samples.iter().map(FeatureFrameBuilder::row).collect();
    frame.sort_by_key(|fv| fv.timestamp);
    frame
}

/// Stateless row encoder; holds the model input width for [`model_input`](Self::model_input).
#[derive(Debug, Clone, Copy)]
pub struct FeatureFrameBuilder {
    feature_dim: usize,
}

impl FeatureFrameBuilder {
    pub fn new(feature_dim: usize) -> Self {
        Self { feature_dim }
    }

    /// Encode one sample. Missing or non-finite metrics become 0.0.
    pub fn row(sample: &TelemetrySample) -> FeatureVector {
        let t = CyclicalTime::encode(sample.timestamp);
        FeatureVector {
            timestamp: sample.timestamp,
            energy: finite_or_zero(sample.energy),
            temperature: finite_or_zero(sample.temperature),
            humidity: finite_or_zero(sample.humidity),
            occupancy: finite_or_zero(sample.occupancy),
            hour_sin: t.hour_sin as f32,
            hour_cos: t.hour_cos as f32,
            dow_sin: t.dow_sin as f32,
            dow_cos: t.dow_cos as f32,
        }
    }

    /// Row-major `[rows, feature_dim]` model input for a frame
    pub fn model_input(&self, frame: &[FeatureVector]) -> Vec<f32> {
        frame.iter().flat_map(|fv| fv.to_vector(self.feature_dim)).collect()
    }
}
