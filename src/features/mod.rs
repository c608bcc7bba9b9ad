//! Feature frame: telemetry rows → fixed per-timestamp feature vectors.

mod pipeline;
mod cyclical;

pub use pipeline::{build_frame, FeatureFrameBuilder};
pub use cyclical::CyclicalTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the vector fed to the detectors
pub const MODEL_FEATURES: [&str; 7] = [
    "energy",
    "temperature",
    "humidity",
    "hour_sin",
    "hour_cos",
    "dow_sin",
    "dow_cos",
];

/// Raw metrics plus cyclical time encodings for one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub timestamp: DateTime<Utc>,
    pub energy: f32,
    pub temperature: f32,
    pub humidity: f32,
    pub occupancy: f32,
    pub hour_sin: f32,
    pub hour_cos: f32,
    pub dow_sin: f32,
    pub dow_cos: f32,
}

impl FeatureVector {
    /// Encode to fixed-dim model input in [`MODEL_FEATURES`] order, padded or truncated to `dim`
    pub fn to_vector(&self, dim: usize) -> Vec<f32> {
        let raw = [
            self.energy,
            self.temperature,
            self.humidity,
            self.hour_sin,
            self.hour_cos,
            self.dow_sin,
            self.dow_cos,
        ];
        let mut out = vec![0.0f32; dim];
        let copy = raw.len().min(dim);
        out[..copy].copy_from_slice(&raw[..copy]);
        out
    }
}
