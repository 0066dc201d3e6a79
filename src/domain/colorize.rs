use image::RgbaImage;
use rayon::prelude::*;

use crate::domain::normalize::Normalization;
use crate::model::{ColorRamp, ValueBuffer};

/// Maps every normalized sample to its ramp color. Pixel `(x, y)` of the
/// image takes sample `(x, y)`; a degenerate range paints the first color.
pub fn colorize(buffer: &ValueBuffer, normalization: &Normalization, ramp: &ColorRamp) -> RgbaImage {
    let (rows, cols) = buffer.dim();
    let mut img = RgbaImage::new(cols as u32, rows as u32);

    if normalization.is_degenerate() {
        let first = ramp.first();
        img.pixels_mut().for_each(|p| *p = first);
        return img;
    }

    let slice = buffer.as_slice().expect("ValueBuffer must be contiguous");
    let raw: &mut [u8] = &mut img;
    raw.par_chunks_exact_mut(4)
        .zip(slice.par_iter())
        .for_each(|(px, &v)| px.copy_from_slice(&ramp.color_for(v).0));
    img
}
