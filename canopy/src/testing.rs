//! Test fixtures: in-memory chips and chip files on disk.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::Array3;
use tiff::encoder::colortype::ColorType;
use tiff::encoder::TiffEncoder;
use tiff::tags::{PhotometricInterpretation, SampleFormat};

use crate::chip::RAW_BANDS;

/// Encoder color type for 18-band u16 chip fixtures.
pub struct ChipBands16;

impl ColorType for ChipBands16 {
    type Inner = u16;
    const TIFF_VALUE: PhotometricInterpretation = PhotometricInterpretation::BlackIsZero;
    const BITS_PER_SAMPLE: &'static [u16] = &[16; RAW_BANDS];
    const SAMPLE_FORMAT: &'static [SampleFormat] = &[SampleFormat::Uint; RAW_BANDS];

    // Mirrors the integer_horizontal_predict! impl the tiff crate uses for
    // its own multi-sample integer color types.
    fn horizontal_predict(row: &[Self::Inner], result: &mut Vec<Self::Inner>) {
        let sample_size = Self::SAMPLE_FORMAT.len();

        if row.len() < sample_size {
            debug_assert!(false);
            return;
        }

        let (start, rest) = row.split_at(sample_size);

        result.extend_from_slice(start);
        if result.capacity() - result.len() < rest.len() {
            return;
        }

        result.extend(
            row.iter()
                .zip(rest)
                .map(|(prev, current)| current.wrapping_sub(*prev)),
        );
    }
}

/// Write band-major `(18, H, W)` raw samples as a pixel-interleaved TIFF,
/// the layout input chips arrive in.
pub fn write_chip_tiff(path: &Path, bands: &Array3<u16>) {
    let (n_bands, height, width) = bands.dim();
    assert_eq!(n_bands, RAW_BANDS, "chip fixtures must have 18 bands");

    let mut interleaved = Vec::with_capacity(n_bands * height * width);
    for y in 0..height {
        for x in 0..width {
            for b in 0..n_bands {
                interleaved.push(bands[[b, y, x]]);
            }
        }
    }

    let file = File::create(path).expect("create fixture file");
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).expect("create tiff encoder");
    encoder
        .write_image::<ChipBands16>(width as u32, height as u32, &interleaved)
        .expect("write fixture image");
}

/// Write an 18-band chip file with every raw sample set to `value`.
pub fn write_constant_chip(path: &Path, height: usize, width: usize, value: u16) {
    let bands = Array3::from_elem((RAW_BANDS, height, width), value);
    write_chip_tiff(path, &bands);
}

/// In-memory band stack with every plane filled with `value`.
pub fn constant_chip_bands(bands: usize, height: usize, width: usize, value: f32) -> Array3<f32> {
    Array3::from_elem((bands, height, width), value)
}
