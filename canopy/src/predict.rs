//! Inference driver: sequential chip-at-a-time scoring and output writing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::Array3;
use thiserror::Error;

use crate::dataset::{ChipSource, DatasetError, RASTER_EXTENSION};
use crate::model::{ScoreError, Scorer};
use crate::raster::{self, RasterError};

/// What to do when a single chip fails to load or score.
///
/// Resource errors (unwritable output directory, unreadable chip directory)
/// are always fatal regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first per-chip error.
    #[default]
    Abort,
    /// Log the error, count the chip as skipped, continue with the next.
    SkipAndLog,
}

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    /// Directory receiving one prediction raster per chip; created if
    /// absent.
    pub output_dir: PathBuf,
    pub failure_policy: FailurePolicy,
}

impl PredictConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Predictions written.
    pub processed: usize,
    /// Chips skipped under [`FailurePolicy::SkipAndLog`].
    pub skipped: usize,
}

/// Errors that can abort an inference run.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("Prediction for '{file_name}' is {actual:?}, chip is {expected:?}")]
    ShapeMismatch {
        file_name: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(transparent)]
    Write(#[from] RasterError),
}

/// Derive the output file name for a chip: every `chip_` in the stem is
/// replaced by `prediction_` and the raster extension is forced.
pub fn prediction_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    format!(
        "{}.{}",
        stem.replace("chip_", "prediction_"),
        RASTER_EXTENSION
    )
}

/// Run inference over every chip in the source, strictly in order, one
/// chip at a time.
///
/// Per chip: score the feature tensor, validate the prediction's spatial
/// shape against the input, and write it as a single-band raster named by
/// [`prediction_name`]. At most one chip's tensors are resident at a time;
/// there is no batching and no cross-chip state.
pub fn run_inference(
    source: &ChipSource,
    scorer: &dyn Scorer,
    config: &PredictConfig,
) -> Result<RunSummary, PredictError> {
    fs::create_dir_all(&config.output_dir).map_err(|source| PredictError::CreateOutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let started = Instant::now();
    let mut summary = RunSummary::default();

    for item in source.chips()? {
        match process_chip(item, scorer, &config.output_dir) {
            Ok(out_name) => {
                tracing::debug!("Wrote '{out_name}'");
                summary.processed += 1;
            }
            Err(e) => match config.failure_policy {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::SkipAndLog => {
                    tracing::warn!("Skipping chip: {e}");
                    summary.skipped += 1;
                }
            },
        }
    }

    tracing::info!(
        "Inference complete: {} predictions written, {} chips skipped in {:.1}s",
        summary.processed,
        summary.skipped,
        started.elapsed().as_secs_f32()
    );

    Ok(summary)
}

fn process_chip(
    item: Result<(Array3<f32>, String), DatasetError>,
    scorer: &dyn Scorer,
    output_dir: &Path,
) -> Result<String, PredictError> {
    let (features, file_name) = item?;
    let (_, height, width) = features.dim();

    let prediction = scorer.score(&features)?;
    if prediction.dim() != (height, width) {
        return Err(PredictError::ShapeMismatch {
            file_name,
            expected: (height, width),
            actual: prediction.dim(),
        });
    }

    let out_name = prediction_name(&file_name);
    raster::write_prediction(&output_dir.join(&out_name), prediction.view())?;

    Ok(out_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::read_bands;
    use crate::testing::write_constant_chip;
    use ndarray::Array2;
    use tempfile::TempDir;

    /// Scorer returning a constant plane matching the input dimensions.
    struct ConstScorer(f32);

    impl Scorer for ConstScorer {
        fn score(&self, features: &Array3<f32>) -> Result<Array2<f32>, ScoreError> {
            let (_, h, w) = features.dim();
            Ok(Array2::from_elem((h, w), self.0))
        }
    }

    /// Scorer returning a plane of the wrong spatial shape.
    struct WrongShapeScorer;

    impl Scorer for WrongShapeScorer {
        fn score(&self, _features: &Array3<f32>) -> Result<Array2<f32>, ScoreError> {
            Ok(Array2::zeros((1, 1)))
        }
    }

    #[test]
    fn test_prediction_name_mapping() {
        assert_eq!(prediction_name("chip_0012.tif"), "prediction_0012.tif");
        assert_eq!(
            prediction_name("chip_AOI-west.tif"),
            "prediction_AOI-west.tif"
        );
        // No prefix: only the extension is forced.
        assert_eq!(prediction_name("tile_7.TIF"), "tile_7.tif");
    }

    #[test]
    fn test_end_to_end_constant_prediction() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_constant_chip(&chips.path().join("chip_0001.tif"), 64, 64, 0);

        let source = ChipSource::new(chips.path());
        let config = PredictConfig::new(out.path());
        let summary = run_inference(&source, &ConstScorer(1.0), &config).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                skipped: 0
            }
        );

        let written = read_bands(&out.path().join("prediction_0001.tif")).unwrap();
        assert_eq!(written.dim(), (1, 64, 64));
        for &v in written.iter() {
            assert_eq!(v, 1.0);
        }
    }

    #[test]
    fn test_output_files_follow_input_order_and_names() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        for name in ["chip_b.tif", "chip_a.tif"] {
            write_constant_chip(&chips.path().join(name), 2, 2, 100);
        }

        let source = ChipSource::new(chips.path());
        let config = PredictConfig::new(out.path());
        run_inference(&source, &ConstScorer(0.5), &config).unwrap();

        let mut written: Vec<String> = std::fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(written, ["prediction_a.tif", "prediction_b.tif"]);
    }

    #[test]
    fn test_abort_policy_propagates_first_error() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(chips.path().join("chip_bad.tif"), b"garbage").unwrap();
        write_constant_chip(&chips.path().join("chip_good.tif"), 2, 2, 0);

        let source = ChipSource::new(chips.path());
        let config = PredictConfig::new(out.path());
        let err = run_inference(&source, &ConstScorer(1.0), &config).unwrap_err();
        assert!(matches!(err, PredictError::Dataset(_)));
    }

    #[test]
    fn test_skip_policy_continues_past_corrupt_chip() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(chips.path().join("chip_bad.tif"), b"garbage").unwrap();
        write_constant_chip(&chips.path().join("chip_good.tif"), 2, 2, 0);

        let source = ChipSource::new(chips.path());
        let config =
            PredictConfig::new(out.path()).with_failure_policy(FailurePolicy::SkipAndLog);
        let summary = run_inference(&source, &ConstScorer(1.0), &config).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                skipped: 1
            }
        );
        assert!(out.path().join("prediction_good.tif").exists());
    }

    #[test]
    fn test_wrong_prediction_shape_is_rejected() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_constant_chip(&chips.path().join("chip_1.tif"), 4, 4, 0);

        let source = ChipSource::new(chips.path());
        let config = PredictConfig::new(out.path());
        let err = run_inference(&source, &WrongShapeScorer, &config).unwrap_err();
        assert!(matches!(err, PredictError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_output_directory_is_created() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let nested = out.path().join("a").join("b");
        write_constant_chip(&chips.path().join("chip_1.tif"), 2, 2, 0);

        let source = ChipSource::new(chips.path());
        let config = PredictConfig::new(&nested);
        run_inference(&source, &ConstScorer(1.0), &config).unwrap();
        assert!(nested.join("prediction_1.tif").exists());
    }

    #[test]
    fn test_empty_directory_is_a_clean_run() {
        let chips = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let source = ChipSource::new(chips.path());
        let config = PredictConfig::new(out.path());
        let summary = run_inference(&source, &ConstScorer(1.0), &config).unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
