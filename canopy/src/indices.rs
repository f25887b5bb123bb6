//! Vegetation index derivation.
//!
//! Pure per-pixel arithmetic over normalized reflectance planes; no I/O,
//! no state. For each timestep the engine emits NDVI, NDWI, EVI and NBR in
//! that order, timestep blocks concatenated in timestep order.
//!
//! Numeric contract: NDVI/NDWI/NBR denominators carry an epsilon guard so a
//! zero denominator yields 0 rather than NaN. EVI's denominator is *not*
//! guarded; degenerate pixels produce NaN or infinities which propagate
//! untouched per IEEE-754. Callers must not treat those as errors.

use ndarray::{Array3, Axis};

use crate::chip::{BANDS_PER_TIMESTEP, TIMESTEPS};

/// Guard added to NDVI/NDWI/NBR denominators.
pub const INDEX_EPSILON: f32 = 1e-6;

/// Indices emitted per timestep: NDVI, NDWI, EVI, NBR.
pub const INDICES_PER_TIMESTEP: usize = 4;

/// Derived planes per chip.
pub const INDEX_BANDS: usize = TIMESTEPS * INDICES_PER_TIMESTEP;

// Band offsets within one timestep block.
const BLUE: usize = 0;
const GREEN: usize = 1;
const RED: usize = 2;
const NIR: usize = 3;
const SWIR2: usize = 5;

/// Compute the `(12, H, W)` index stack for an 18-band reflectance chip.
///
/// The input must be band-major with the fixed per-timestep band order
/// (blue, green, red, nir, swir1, swir2); only the band count is checked
/// here, via debug assertion - the feature assembler validates it for real.
pub fn compute_indices(bands: &Array3<f32>) -> Array3<f32> {
    let (n_bands, height, width) = bands.dim();
    debug_assert_eq!(n_bands, TIMESTEPS * BANDS_PER_TIMESTEP);

    let mut out = Array3::<f32>::zeros((INDEX_BANDS, height, width));

    for t in 0..TIMESTEPS {
        let base = t * BANDS_PER_TIMESTEP;
        let blue = bands.index_axis(Axis(0), base + BLUE);
        let green = bands.index_axis(Axis(0), base + GREEN);
        let red = bands.index_axis(Axis(0), base + RED);
        let nir = bands.index_axis(Axis(0), base + NIR);
        let swir2 = bands.index_axis(Axis(0), base + SWIR2);

        let row = t * INDICES_PER_TIMESTEP;
        for y in 0..height {
            for x in 0..width {
                let b = blue[[y, x]];
                let g = green[[y, x]];
                let r = red[[y, x]];
                let n = nir[[y, x]];
                let s2 = swir2[[y, x]];

                // NDVI, NDWI, EVI, NBR
                out[[row, y, x]] = (n - r) / (n + r + INDEX_EPSILON);
                out[[row + 1, y, x]] = (g - n) / (g + n + INDEX_EPSILON);
                out[[row + 2, y, x]] = 2.5 * (n - r) / (n + 6.0 * r - 7.5 * b + 1.0);
                out[[row + 3, y, x]] = (n - s2) / (n + s2 + INDEX_EPSILON);
            }
        }
    }

    out
}
