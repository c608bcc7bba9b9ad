//! Detector handles for anomaly scoring.
//!
//! A detector is an opaque batch scoring function. Each one lives behind a
//! [`LazyDetector`] that loads its artifact at most once per process and
//! resolves to a [`DetectorHandle`]: either `Available` or `Unavailable`.

mod onnx;

pub use onnx::{OnnxDetector, OnnxOutput};

use crate::error::DetectorError;
use crate::features::FeatureVector;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Raw, uncalibrated score per row. Larger means more anomalous.
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    fn score_batch(&self, frame: &[FeatureVector]) -> Result<Vec<f64>, DetectorError>;
}

/// Detector backed by a closure, for in-process models and tests.
pub struct FnDetector<F> {
    name: String,
    score_fn: F,
}

impl<F> FnDetector<F>
where
    F: Fn(&[FeatureVector]) -> Result<Vec<f64>, DetectorError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, score_fn: F) -> Self {
        Self {
            name: name.into(),
            score_fn,
        }
    }
}

impl<F> Detector for FnDetector<F>
where
    F: Fn(&[FeatureVector]) -> Result<Vec<f64>, DetectorError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn score_batch(&self, frame: &[FeatureVector]) -> Result<Vec<f64>, DetectorError> {
        (self.score_fn)(frame)
    }
}

/// Loaded state of one detector.
#[derive(Clone)]
pub enum DetectorHandle {
    Available(Arc<dyn Detector>),
    Unavailable { reason: String },
}

impl fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorHandle::Available(d) => f.debug_tuple("Available").field(&d.name()).finish(),
            DetectorHandle::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

impl DetectorHandle {
    pub fn available(detector: impl Detector + 'static) -> Self {
        DetectorHandle::Available(Arc::new(detector))
    }

    pub fn from_fn<F>(name: impl Into<String>, score_fn: F) -> Self
    where
        F: Fn(&[FeatureVector]) -> Result<Vec<f64>, DetectorError> + Send + Sync + 'static,
    {
        Self::available(FnDetector::new(name, score_fn))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        DetectorHandle::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, DetectorHandle::Available(_))
    }

    /// Score a batch, checking the result has one finite score per row.
    pub fn raw_scores(&self, frame: &[FeatureVector]) -> Result<Vec<f64>, DetectorError> {
        let detector = match self {
            DetectorHandle::Available(d) => d,
            DetectorHandle::Unavailable { reason } => {
                return Err(DetectorError::Unavailable(reason.clone()))
            }
        };
        let scores = detector.score_batch(frame)?;
        if scores.len() != frame.len() {
            return Err(DetectorError::LengthMismatch {
                expected: frame.len(),
                got: scores.len(),
            });
        }
        if let Some(row) = scores.iter().position(|s| !s.is_finite()) {
            return Err(DetectorError::NonFinite(row));
        }
        Ok(scores)
    }
}

type Loader = Box<dyn Fn() -> DetectorHandle + Send + Sync>;

/// Load-once cell around a detector. Concurrent first calls to [`handle`](Self::handle)
/// run the loader exactly once and all observe the same handle.
pub struct LazyDetector {
    name: String,
    loader: Loader,
    cell: OnceLock<DetectorHandle>,
}

impl LazyDetector {
    pub fn new<L>(name: impl Into<String>, loader: L) -> Self
    where
        L: Fn() -> DetectorHandle + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    /// Already-resolved handle; the loader never runs.
    pub fn ready(name: impl Into<String>, handle: DetectorHandle) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(handle.clone());
        Self {
            name: name.into(),
            loader: Box::new(move || handle.clone()),
            cell,
        }
    }

    /// ONNX artifact at `path`, loaded on first use.
    pub fn onnx(name: impl Into<String>, path: PathBuf, output: OnnxOutput, feature_dim: usize) -> Self {
        let name = name.into();
        let label = name.clone();
        Self::new(name, move || match OnnxDetector::load(&label, &path, output, feature_dim) {
            Ok(detector) => DetectorHandle::available(detector),
            Err(e) => DetectorHandle::unavailable(e.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn handle(&self) -> &DetectorHandle {
        self.cell.get_or_init(|| {
            let handle = (self.loader)();
            match &handle {
                DetectorHandle::Available(_) => tracing::info!(detector = %self.name, "detector loaded"),
                DetectorHandle::Unavailable { reason } => {
                    tracing::warn!(detector = %self.name, %reason, "detector unavailable; contributes zero")
                }
            }
            handle
        })
    }
}
