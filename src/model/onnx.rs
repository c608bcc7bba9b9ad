//! ONNX Runtime detectors. Input: [rows, feature_dim] f32.
//! Reconstruction models return the rebuilt input; outlier models return a
//! normality score per row (higher = more normal), which is negated here.

use super::Detector;
use crate::error::DetectorError;
use crate::features::{FeatureFrameBuilder, FeatureVector};
use ndarray::{Array2, Axis, CowArray};
use std::path::Path;
use std::sync::{Arc, OnceLock};

static ORT_ENV: OnceLock<Option<Arc<ort::Environment>>> = OnceLock::new();

fn init_env() -> Option<&'static Arc<ort::Environment>> {
    ORT_ENV
        .get_or_init(|| {
            match ort::Environment::builder().with_name("twin-advisor").build() {
                Ok(env) => Some(env.into_arc()),
                Err(e) => {
                    tracing::warn!(error = %e, "ONNX runtime environment failed to start");
                    None
                }
            }
        })
        .as_ref()
}

/// How a model's output tensor maps to a raw anomaly score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnnxOutput {
    /// Output 0 is the reconstruction; score is the row's mean squared error.
    Reconstruction,
    /// Output at this index holds a normality score per row; score is its negation.
    Outlier { index: usize },
}

pub struct OnnxDetector {
    name: String,
    session: ort::Session,
    output: OnnxOutput,
    feature_dim: usize,
}

fn inference(e: impl std::fmt::Display) -> DetectorError {
    DetectorError::Inference(e.to_string())
}

impl OnnxDetector {
    /// Load model from path. A missing or invalid file is reported as `Unavailable`.
    pub fn load(name: &str, path: &Path, output: OnnxOutput, feature_dim: usize) -> Result<Self, DetectorError> {
        if !path.exists() {
            return Err(DetectorError::Unavailable(format!("{} not found", path.display())));
        }
        let env = init_env()
            .ok_or_else(|| DetectorError::Unavailable("ONNX runtime not initialized".to_string()))?;

        let session = ort::SessionBuilder::new(env)
            .and_then(|b| b.with_model_from_file(path))
            .map_err(|e| DetectorError::Unavailable(format!("{}: {e}", path.display())))?;

        Ok(Self {
            name: name.to_string(),
            session,
            output,
            feature_dim,
        })
    }

    fn input<'a>(&self, frame: &[FeatureVector]) -> Result<CowArray<'a, f32, ndarray::IxDyn>, DetectorError> {
        let flat = FeatureFrameBuilder::new(self.feature_dim).model_input(frame);
        let arr = Array2::from_shape_vec((frame.len(), self.feature_dim), flat).map_err(inference)?;
        Ok(CowArray::from(arr.into_dyn()))
    }
}

impl Detector for OnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn score_batch(&self, frame: &[FeatureVector]) -> Result<Vec<f64>, DetectorError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.input(frame)?;
        let value = ort::Value::from_array(self.session.allocator(), &input).map_err(inference)?;
        let outputs = self.session.run(vec![value]).map_err(inference)?;

        let index = match self.output {
            OnnxOutput::Reconstruction => 0,
            OnnxOutput::Outlier { index } => index,
        };
        let out = outputs
            .get(index)
            .ok_or_else(|| DetectorError::Inference(format!("model has no output {index}")))?;
        let tensor = out.try_extract::<f32>().map_err(inference)?;
        let view = tensor.view();

        match self.output {
            OnnxOutput::Reconstruction => {
                let recon = view
                    .view()
                    .into_dimensionality::<ndarray::Ix2>()
                    .map_err(inference)?;
                let cols = recon.ncols().min(self.feature_dim).max(1);
                let errors = frame
                    .iter()
                    .zip(recon.axis_iter(Axis(0)))
                    .map(|(fv, row)| {
                        let x = fv.to_vector(self.feature_dim);
                        let sq: f32 = x.iter().zip(row.iter()).take(cols).map(|(a, b)| (a - b) * (a - b)).sum();
                        (sq / cols as f32) as f64
                    })
                    .collect();
                Ok(errors)
            }
            OnnxOutput::Outlier { .. } => {
                let rows = frame.len();
                let flat: Vec<f32> = view.iter().copied().collect();
                if flat.is_empty() || flat.len() % rows != 0 {
                    return Err(DetectorError::LengthMismatch {
                        expected: rows,
                        got: flat.len(),
                    });
                }
                // First column when the model emits several values per row
                let stride = flat.len() / rows;
                Ok(flat.iter().step_by(stride).map(|s| -(*s as f64)).collect())
            }
        }
    }
}
