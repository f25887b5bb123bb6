//! Feature assembly: raw reflectance planes + derived index stack.

use ndarray::{concatenate, Array3, Axis};
use thiserror::Error;

use crate::chip::{Chip, RAW_BANDS};
use crate::indices::{compute_indices, INDEX_BANDS};

/// Channels in the assembled feature tensor: 18 raw bands followed by the
/// 12-plane index stack. The downstream model was trained against exactly
/// this count and order.
pub const FEATURE_BANDS: usize = RAW_BANDS + INDEX_BANDS;

/// Errors raised while assembling the feature tensor.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Chip '{file_name}' has {actual} bands, expected {expected}")]
    BandCount {
        file_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to concatenate feature planes: {0}")]
    Concat(#[from] ndarray::ShapeError),
}

/// Assemble the `(30, H, W)` feature tensor for one normalized chip.
///
/// The chip's 18 planes come first, unchanged, followed by the index stack.
/// A chip with any other band count is rejected - truncating or padding
/// would silently corrupt predictions, since the model reads channels by
/// position.
pub fn assemble_features(chip: &Chip) -> Result<Array3<f32>, FeatureError> {
    let bands = chip.bands.dim().0;
    if bands != RAW_BANDS {
        return Err(FeatureError::BandCount {
            file_name: chip.file_name.clone(),
            expected: RAW_BANDS,
            actual: bands,
        });
    }

    let indices = compute_indices(&chip.bands);
    let features = concatenate(Axis(0), &[chip.bands.view(), indices.view()])?;

    Ok(features)
}
