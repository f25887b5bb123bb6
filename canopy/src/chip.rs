//! Chip model: a fixed-layout stack of reflectance planes.

use std::path::Path;

use ndarray::Array3;

use crate::raster::{self, RasterError};

/// Temporal observations stacked in one chip.
pub const TIMESTEPS: usize = 3;

/// Spectral bands per timestep, in fixed order:
/// blue, green, red, nir, swir1, swir2.
pub const BANDS_PER_TIMESTEP: usize = 6;

/// Raw reflectance planes in a well-formed chip.
pub const RAW_BANDS: usize = TIMESTEPS * BANDS_PER_TIMESTEP;

/// Fixed-point scale of raw samples; dividing by this yields reflectance
/// in `[0, 1]`.
pub const REFLECTANCE_SCALE: f32 = 10000.0;

/// One multi-temporal satellite chip, normalized to reflectance.
///
/// Planes are band-major `(bands, height, width)`; band and timestep order
/// follow the layout constants above and are meaningful - the downstream
/// model was trained against exactly this ordering.
#[derive(Debug, Clone)]
pub struct Chip {
    /// Normalized reflectance planes.
    pub bands: Array3<f32>,
    /// File name (not full path) the chip was loaded from.
    pub file_name: String,
}

impl Chip {
    /// Load a chip from a raster file and normalize raw fixed-point samples
    /// to reflectance (`raw / 10000.0`).
    ///
    /// Band count is not validated here; the feature assembler enforces the
    /// 18-band contract so that a bad file surfaces as a data-validation
    /// error at the point the contract matters.
    pub fn from_raster(path: &Path) -> Result<Chip, RasterError> {
        let mut bands = raster::read_bands(path)?;
        bands.mapv_inplace(|v| v / REFLECTANCE_SCALE);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Chip { bands, file_name })
    }

    pub fn height(&self) -> usize {
        self.bands.dim().1
    }

    pub fn width(&self) -> usize {
        self.bands.dim().2
    }
}
