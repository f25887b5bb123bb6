//! Scoring model interface and ONNX-backed implementation.
//!
//! The pipeline treats the model as an opaque capability: a feature tensor
//! goes in, a prediction plane comes out. Anything satisfying [`Scorer`]
//! plugs in; [`OnnxScorer`] is the production implementation, loading a
//! session once from a weights artifact and holding it for the run.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::{Array2, Array3, Axis};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;

use crate::features::FEATURE_BANDS;

/// Input channels the model was trained against.
pub const MODEL_IN_CHANNELS: usize = FEATURE_BANDS;

/// Output classes: one regression plane.
pub const MODEL_OUT_CLASSES: usize = 1;

/// Errors from model loading or scoring.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Failed to load model '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    #[error("Model '{path}' declares no {what}")]
    MissingIo { path: PathBuf, what: &'static str },

    #[error("Feature tensor has {actual} channels, model expects {expected}")]
    InputChannels { expected: usize, actual: usize },

    #[error("Model inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("Model returned {actual} values for a {height}x{width} chip")]
    OutputShape {
        height: usize,
        width: usize,
        actual: usize,
    },
}

/// A pixel-wise scoring function: `(30, H, W)` features in, `(H, W)`
/// prediction out.
pub trait Scorer {
    fn score(&self, features: &Array3<f32>) -> Result<Array2<f32>, ScoreError>;
}

/// ONNX-session scorer.
///
/// The session is resolved once at load time (including input/output tensor
/// names) and held for the duration of the run. Scoring is a single
/// blocking call; any internal parallelism of the runtime is opaque here.
pub struct OnnxScorer {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxScorer {
    /// Load model weights from an ONNX file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        let load_err = |source| ScoreError::Load {
            path: path.to_path_buf(),
            source,
        };

        let session = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_err)?
            .commit_from_file(path)
            .map_err(load_err)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| ScoreError::MissingIo {
                path: path.to_path_buf(),
                what: "inputs",
            })?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ScoreError::MissingIo {
                path: path.to_path_buf(),
                what: "outputs",
            })?;

        tracing::info!("Loaded model from '{}'", path.display());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &Array3<f32>) -> Result<Array2<f32>, ScoreError> {
        let (channels, height, width) = features.dim();
        if channels != MODEL_IN_CHANNELS {
            return Err(ScoreError::InputChannels {
                expected: MODEL_IN_CHANNELS,
                actual: channels,
            });
        }

        // Batch of one: (30, H, W) -> (1, 30, H, W).
        let batch = features.clone().insert_axis(Axis(0));
        let input = Tensor::from_array(batch)?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = session.run(ort::inputs![self.input_name.as_str() => &input])?;
        let output = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;

        // Expect (1, 1, H, W) back; accept any layout with the right volume.
        if output.len() != height * width {
            return Err(ScoreError::OutputShape {
                height,
                width,
                actual: output.len(),
            });
        }
        let values: Vec<f32> = output.iter().copied().collect();
        let plane = Array2::from_shape_vec((height, width), values).map_err(|_| {
            ScoreError::OutputShape {
                height,
                width,
                actual: output.len(),
            }
        })?;

        Ok(plane)
    }
}
