//! Shared fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use twin_advisor::model::{DetectorHandle, LazyDetector};
use twin_advisor::{EnsembleScorer, FeatureVector, TelemetrySample};

/// Monday 2024-03-04 00:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

/// `n` hourly samples from `start`, values from `f(i)` as (energy, temperature, humidity, occupancy).
pub fn hourly(start: DateTime<Utc>, n: usize, f: impl Fn(usize) -> (f64, f64, f64, f64)) -> Vec<TelemetrySample> {
    (0..n)
        .map(|i| {
            let (e, t, h, o) = f(i);
            TelemetrySample::new(start + Duration::hours(i as i64), e, t, h, o)
        })
        .collect()
}

/// Raw score = the row's energy feature.
pub fn energy_detector(name: &str) -> Arc<LazyDetector> {
    Arc::new(LazyDetector::ready(
        name,
        DetectorHandle::from_fn(name.to_string(), |frame: &[FeatureVector]| {
            Ok(frame.iter().map(|fv| fv.energy as f64).collect())
        }),
    ))
}

pub fn unavailable(name: &str) -> Arc<LazyDetector> {
    Arc::new(LazyDetector::ready(name, DetectorHandle::unavailable("not trained")))
}

pub fn scorer(a: Arc<LazyDetector>, b: Arc<LazyDetector>) -> Arc<EnsembleScorer> {
    Arc::new(EnsembleScorer::new(a, b))
}
