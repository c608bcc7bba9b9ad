//! Telemetry rows and the source interface the core reads them through.

use crate::error::TelemetryError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One time-indexed telemetry row. Metrics a source does not report are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub occupancy: Option<f64>,
}

impl TelemetrySample {
    pub fn new(timestamp: DateTime<Utc>, energy: f64, temperature: f64, humidity: f64, occupancy: f64) -> Self {
        Self {
            timestamp,
            energy: Some(energy),
            temperature: Some(temperature),
            humidity: Some(humidity),
            occupancy: Some(occupancy),
        }
    }
}

/// Named metric column, for analyzers that read a single series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Energy,
    Temperature,
    Humidity,
    Occupancy,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Energy => "energy",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Occupancy => "occupancy",
        }
    }

    pub fn value(self, sample: &TelemetrySample) -> Option<f64> {
        match self {
            Metric::Energy => sample.energy,
            Metric::Temperature => sample.temperature,
            Metric::Humidity => sample.humidity,
            Metric::Occupancy => sample.occupancy,
        }
    }
}

/// Finite values of one metric across the samples, in sample order.
pub fn series(samples: &[TelemetrySample], metric: Metric) -> Vec<f64> {
    samples
        .iter()
        .filter_map(|s| metric.value(s))
        .filter(|v| v.is_finite())
        .collect()
}

/// Samples sorted by timestamp (stable, so equal timestamps keep source order).
pub fn sort_by_time(mut samples: Vec<TelemetrySample>) -> Vec<TelemetrySample> {
    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// Samples with `now - hours <= timestamp <= now`. Input must be time-ordered.
pub fn window(samples: &[TelemetrySample], now: DateTime<Utc>, hours: i64) -> &[TelemetrySample] {
    let start = now - Duration::hours(hours);
    let lo = samples.partition_point(|s| s.timestamp < start);
    let hi = samples.partition_point(|s| s.timestamp <= now);
    &samples[lo..hi.max(lo)]
}

/// External telemetry collaborator. Returns rows in `[start, end]`, possibly none.
pub trait TelemetrySource: Send + Sync {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TelemetrySample>, TelemetryError>;
}

/// Reads a JSON array of samples from disk on every fetch.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Every sample in the file, time-ordered.
    pub fn load_all(&self) -> Result<Vec<TelemetrySample>, TelemetryError> {
        let data = std::fs::read_to_string(&self.path)?;
        let samples: Vec<TelemetrySample> = serde_json::from_str(&data)?;
        Ok(sort_by_time(samples))
    }
}

impl TelemetrySource for JsonFileSource {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TelemetrySample>, TelemetryError> {
        let mut samples = self.load_all()?;
        samples.retain(|s| s.timestamp >= start && s.timestamp <= end);
        Ok(samples)
    }
}
