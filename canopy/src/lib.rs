//! Canopy - batch inference for biomass estimation over satellite chips.
//!
//! The pipeline reads fixed-layout multi-temporal reflectance chips
//! (18 bands: 3 timesteps x 6 spectral bands), derives four vegetation
//! indices per timestep, feeds the combined 30-band feature tensor to a
//! pretrained pixel-wise regression model, and writes one single-band
//! prediction raster per chip.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use canopy::{ChipSource, OnnxScorer, PredictConfig, run_inference};
//!
//! let source = ChipSource::new("chips/");
//! let scorer = OnnxScorer::load("weights.onnx")?;
//! let config = PredictConfig::new("predictions/");
//!
//! let summary = run_inference(&source, &scorer, &config)?;
//! println!("{} predictions written", summary.processed);
//! ```

mod chip;
mod dataset;
mod features;
mod indices;
mod model;
mod predict;
pub mod raster;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Chip layout
// ============================================================================

pub use chip::{Chip, BANDS_PER_TIMESTEP, RAW_BANDS, REFLECTANCE_SCALE, TIMESTEPS};

// ============================================================================
// Feature derivation
// ============================================================================

pub use features::{assemble_features, FeatureError, FEATURE_BANDS};
pub use indices::{compute_indices, INDEX_BANDS, INDEX_EPSILON, INDICES_PER_TIMESTEP};

// ============================================================================
// Chip enumeration
// ============================================================================

pub use dataset::{ChipIter, ChipSource, DatasetError, RASTER_EXTENSION};

// ============================================================================
// Scoring and inference
// ============================================================================

pub use model::{OnnxScorer, ScoreError, Scorer, MODEL_IN_CHANNELS, MODEL_OUT_CLASSES};
pub use predict::{
    prediction_name, run_inference, FailurePolicy, PredictConfig, PredictError, RunSummary,
};
pub use raster::RasterError;
