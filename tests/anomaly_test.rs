//! Ensemble scorer: normalization, degradation, threshold policies, lazy loading.

mod common;

use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use twin_advisor::anomaly::{min_max_normalize, ThresholdPolicy};
use twin_advisor::model::{DetectorHandle, LazyDetector, OnnxOutput};
use twin_advisor::{build_frame, DetectorError, EnsembleScorer, FeatureVector};

fn frame(n: usize) -> Vec<FeatureVector> {
    build_frame(&common::hourly(common::t0(), n, |i| (i as f64, 21.0, 40.0, 0.5)))
}

fn fixed_scores(name: &str, scores: Vec<f64>) -> Arc<LazyDetector> {
    Arc::new(LazyDetector::ready(
        name,
        DetectorHandle::from_fn(name.to_string(), move |_: &[FeatureVector]| Ok(scores.clone())),
    ))
}

fn failing(name: &str) -> Arc<LazyDetector> {
    Arc::new(LazyDetector::ready(
        name,
        DetectorHandle::from_fn(name.to_string(), |_: &[FeatureVector]| {
            Err(DetectorError::Inference("shape mismatch".into()))
        }),
    ))
}

#[test]
fn output_matches_input_length_order_and_range() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let a: Vec<f64> = (0..64).map(|_| rng.gen_range(0.0..5.0)).collect();
    let b: Vec<f64> = (0..64).map(|_| rng.gen_range(-0.7..-0.3)).collect();
    let scorer = common::scorer(fixed_scores("ae", a), fixed_scores("if", b));
    let f = frame(64);

    for policy in [ThresholdPolicy::adaptive(), ThresholdPolicy::fixed()] {
        let scores = scorer.score(&f, policy);
        assert_eq!(scores.len(), f.len());
        for (s, fv) in scores.iter().zip(&f) {
            assert_eq!(s.timestamp, fv.timestamp);
            assert!((0.0..=1.0).contains(&s.score));
        }
    }
}

#[test]
fn both_unavailable_scores_zero_and_fixed_flags_nothing() {
    let scorer = common::scorer(common::unavailable("ae"), common::unavailable("if"));
    let scores = scorer.score(&frame(20), ThresholdPolicy::fixed());
    assert_eq!(scores.len(), 20);
    assert!(scores.iter().all(|s| s.score == 0.0 && !s.is_anomaly));
}

#[test]
fn adaptive_flags_whole_flat_batch() {
    let scorer = common::scorer(common::unavailable("ae"), common::unavailable("if"));
    let scores = scorer.score(&frame(20), ThresholdPolicy::adaptive());
    assert_eq!(scores.len(), 20);
    assert!(scores.iter().all(|s| s.score == 0.0));
    assert_eq!(scores.iter().filter(|s| s.is_anomaly).count(), 20);
}

#[test]
fn constant_detector_contributes_zero() {
    assert_eq!(min_max_normalize(&[3.0; 5]), vec![0.0; 5]);
    assert_eq!(min_max_normalize(&[1.0, 1.0 + 1e-9, 1.0]), vec![0.0; 3]);

    let scorer = common::scorer(fixed_scores("ae", vec![4.2; 5]), fixed_scores("if", vec![0.0, 1.0, 2.0, 3.0, 4.0]));
    let scores = scorer.score(&frame(5), ThresholdPolicy::fixed());
    let got: Vec<f64> = scores.iter().map(|s| s.score).collect();
    assert_eq!(got, vec![0.0, 0.125, 0.25, 0.375, 0.5]);
    assert!(scores.iter().all(|s| !s.is_anomaly));
}

#[test]
fn adaptive_flags_top_ten_of_hundred_increasing() {
    let scorer = common::scorer(common::energy_detector("ae"), common::energy_detector("if"));
    let scores = scorer.score(&frame(100), ThresholdPolicy::adaptive());
    let flagged: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_anomaly)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(flagged, (90..100).collect::<Vec<_>>());
}

#[test]
fn fixed_threshold_is_absolute() {
    let scorer = common::scorer(common::energy_detector("ae"), common::energy_detector("if"));
    // combined = i / 20
    let scores = scorer.score(&frame(21), ThresholdPolicy::fixed());
    let flagged = scores.iter().filter(|s| s.is_anomaly).count();
    assert_eq!(flagged, 4); // 0.85, 0.9, 0.95, 1.0

    let none = scorer.score(&frame(21), ThresholdPolicy::Fixed { threshold: 1.5 });
    assert!(none.iter().all(|s| !s.is_anomaly));
}

#[test]
fn runtime_failure_degrades_like_unavailable() {
    let f = frame(10);
    let failing = common::scorer(failing("ae"), common::energy_detector("if")).score(&f, ThresholdPolicy::fixed());
    let missing =
        common::scorer(common::unavailable("ae"), common::energy_detector("if")).score(&f, ThresholdPolicy::fixed());
    assert_eq!(failing, missing);
    assert_eq!(failing.last().map(|s| s.score), Some(0.5));
}

#[test]
fn wrong_length_or_non_finite_output_is_ignored() {
    let f = frame(4);
    let short = common::scorer(fixed_scores("ae", vec![1.0, 2.0]), common::unavailable("if"));
    assert!(short.score(&f, ThresholdPolicy::fixed()).iter().all(|s| s.score == 0.0));

    let nan = common::scorer(fixed_scores("ae", vec![1.0, f64::NAN, 2.0, 3.0]), common::unavailable("if"));
    assert!(nan.score(&f, ThresholdPolicy::fixed()).iter().all(|s| s.score == 0.0));
}

#[test]
fn empty_frame_skips_detectors() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let lazy = Arc::new(LazyDetector::new("ae", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        DetectorHandle::unavailable("never")
    }));
    let scorer = EnsembleScorer::new(lazy.clone(), common::unavailable("if"));
    assert!(scorer.score(&[], ThresholdPolicy::adaptive()).is_empty());
    assert!(!lazy.is_loaded());
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn lazy_detector_loads_once_under_contention() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let lazy = Arc::new(LazyDetector::new("ae", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(20));
        DetectorHandle::from_fn("ae", |frame: &[FeatureVector]| Ok(vec![0.0; frame.len()]))
    }));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lazy = lazy.clone();
            std::thread::spawn(move || lazy.handle().is_available())
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(lazy.is_loaded());
}

#[test]
fn missing_onnx_artifact_is_unavailable() {
    let lazy = LazyDetector::onnx(
        "autoencoder",
        PathBuf::from("nonexistent/autoencoder.onnx"),
        OnnxOutput::Reconstruction,
        7,
    );
    assert!(!lazy.handle().is_available());
    let err = lazy.handle().raw_scores(&frame(3)).unwrap_err();
    assert!(matches!(err, DetectorError::Unavailable(_)));
}

#[test]
fn scorer_is_shareable_across_threads() {
    let scorer = common::scorer(common::energy_detector("ae"), common::energy_detector("if"));
    let f = Arc::new(frame(50));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scorer = scorer.clone();
            let f = f.clone();
            std::thread::spawn(move || scorer.score(&f, ThresholdPolicy::adaptive()))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
