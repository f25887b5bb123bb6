//! Chip enumeration and lazy per-file loading.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use thiserror::Error;

use crate::chip::Chip;
use crate::features::{assemble_features, FeatureError};
use crate::raster::RasterError;

/// File extension of input chips and output predictions.
pub const RASTER_EXTENSION: &str = "tif";

/// Errors that can occur while enumerating or loading chips.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read chip directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// A directory of chips, iterated lazily in sorted file-name order.
///
/// This is a restartable factory rather than a stateful cursor: each call
/// to [`ChipSource::chips`] re-enumerates the directory, which keeps batch
/// ordering deterministic and lets tests assert exact output sets.
#[derive(Debug, Clone)]
pub struct ChipSource {
    dir: PathBuf,
}

impl ChipSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of all chip files in the directory, sorted by name.
    /// Extension matching is case-insensitive.
    pub fn chip_files(&self) -> Result<Vec<PathBuf>, DatasetError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| DatasetError::ReadDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|s| s.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(RASTER_EXTENSION))
            })
            .collect();
        files.sort();

        Ok(files)
    }

    /// Start one pass over the directory, yielding `(feature tensor,
    /// file name)` per chip. Decode and validation failures surface as
    /// errors on the corresponding item; enumeration itself fails eagerly.
    pub fn chips(&self) -> Result<ChipIter, DatasetError> {
        let files = self.chip_files()?;
        tracing::info!("Found {} chips in '{}'", files.len(), self.dir.display());

        Ok(ChipIter {
            files: files.into_iter(),
        })
    }
}

/// One pass over a chip directory. Chips are decoded, normalized and
/// featurized on `next()`, one file at a time.
#[derive(Debug)]
pub struct ChipIter {
    files: std::vec::IntoIter<PathBuf>,
}

impl Iterator for ChipIter {
    type Item = Result<(Array3<f32>, String), DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        Some(load_chip(&path))
    }
}

fn load_chip(path: &Path) -> Result<(Array3<f32>, String), DatasetError> {
    let chip = Chip::from_raster(path)?;
    let file_name = chip.file_name.clone();
    let features = assemble_features(&chip)?;
    Ok((features, file_name))
}
