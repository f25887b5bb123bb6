//! TIFF read/write for chips and prediction maps.
//!
//! Chips are multiband TIFFs with pixel-interleaved samples; decoding
//! produces a band-major `(bands, height, width)` array. Predictions are
//! written back as plain single-band `f32` TIFFs. No georeferencing tags
//! are read or written - outputs carry pixel data only.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayView2};
use thiserror::Error;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};

/// Errors that can occur while reading or writing raster files.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to open raster '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create raster '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode raster '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Failed to encode raster '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Unsupported sample format in raster '{path}'")]
    UnsupportedSampleFormat { path: PathBuf },

    #[error("Malformed raster '{path}': {samples} samples do not fill {width}x{height} pixels")]
    MalformedPlanes {
        path: PathBuf,
        samples: usize,
        width: usize,
        height: usize,
    },
}

/// Decode every band of a TIFF into a band-major `(bands, height, width)`
/// array of raw (unscaled) sample values.
///
/// The band count is inferred from the sample buffer, so any multiband
/// layout decodes; callers validate the count against their own contract.
pub fn read_bands(path: &Path) -> Result<Array3<f32>, RasterError> {
    let file = File::open(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |source| RasterError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = Decoder::new(BufReader::new(file)).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let image = decoder.read_image().map_err(decode_err)?;

    let samples: Vec<f32> = match image {
        DecodingResult::U8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        _ => {
            return Err(RasterError::UnsupportedSampleFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let (width, height) = (width as usize, height as usize);
    let pixels = width * height;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(RasterError::MalformedPlanes {
            path: path.to_path_buf(),
            samples: samples.len(),
            width,
            height,
        });
    }
    let bands = samples.len() / pixels;

    // Deinterleave pixel-interleaved samples into band-major planes.
    let mut planes = Array3::<f32>::zeros((bands, height, width));
    for y in 0..height {
        for x in 0..width {
            let base = (y * width + x) * bands;
            for b in 0..bands {
                planes[[b, y, x]] = samples[base + b];
            }
        }
    }

    Ok(planes)
}

/// Write a single-band `f32` prediction plane as a TIFF.
pub fn write_prediction(path: &Path, plane: ArrayView2<'_, f32>) -> Result<(), RasterError> {
    let (height, width) = plane.dim();
    let data: Vec<f32> = plane.iter().copied().collect();

    let file = File::create(path).map_err(|source| RasterError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let encode_err = |source| RasterError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(encode_err)?;
    encoder
        .write_image::<colortype::Gray32Float>(width as u32, height as u32, &data)
        .map_err(encode_err)?;

    Ok(())
}
