//! Photometric adjustment chain.
//!
//! Applies the five customer adjustments to RGB pixel data with CSS
//! filter-function semantics.
//!
//! ## Adjustment Order
//! 1. Brightness
//! 2. Contrast
//! 3. Saturation
//! 4. Blur
//! 5. Sepia
//!
//! Values are clamped to 0.0..=1.0 after every step. The chain always runs
//! on a working copy in `f32`, so only the final write back rounds.

use crate::color_matrix::ColorMatrix;
use crate::decode::DecodedImage;
use crate::Adjustments;

/// Apply all adjustments to an image in place.
///
/// Identity adjustments leave the pixels untouched.
pub fn apply_adjustments(image: &mut DecodedImage, adjustments: &Adjustments) {
    let adj = adjustments.clamped();
    if adj.is_default() || image.is_empty() {
        return;
    }

    let mut working: Vec<f32> = image.pixels.iter().map(|&v| v as f32 / 255.0).collect();

    let brightness = adj.brightness / 100.0;
    let contrast = adj.contrast / 100.0;
    let saturate = ColorMatrix::saturate(adj.saturation / 100.0);

    for chunk in working.chunks_exact_mut(3) {
        let (mut r, mut g, mut b) = (chunk[0], chunk[1], chunk[2]);
        (r, g, b) = clamp_rgb(apply_brightness(r, g, b, brightness));
        (r, g, b) = clamp_rgb(apply_contrast(r, g, b, contrast));
        (r, g, b) = clamp_rgb(saturate.apply(r, g, b));
        chunk.copy_from_slice(&[r, g, b]);
    }

    if adj.blur > 0.0 {
        apply_blur(&mut working, image.width, image.height, adj.blur);
    }

    if adj.sepia > 0.0 {
        let sepia = ColorMatrix::sepia(adj.sepia / 100.0);
        for chunk in working.chunks_exact_mut(3) {
            let (r, g, b) = clamp_rgb(sepia.apply(chunk[0], chunk[1], chunk[2]));
            chunk.copy_from_slice(&[r, g, b]);
        }
    }

    for (dst, src) in image.pixels.iter_mut().zip(&working) {
        *dst = (src.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
}

/// Return an adjusted copy.
pub fn adjusted(image: &DecodedImage, adjustments: &Adjustments) -> DecodedImage {
    let mut out = image.clone();
    apply_adjustments(&mut out, adjustments);
    out
}

#[inline]
fn clamp_rgb((r, g, b): (f32, f32, f32)) -> (f32, f32, f32) {
    (r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
}

/// `brightness(factor)`: linear multiply.
#[inline]
fn apply_brightness(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    (r * factor, g * factor, b * factor)
}

/// `contrast(factor)`: scale around mid grey.
///
/// Formula: `output = (input - 0.5) * factor + 0.5`
#[inline]
fn apply_contrast(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    let midpoint = 0.5;
    (
        (r - midpoint) * factor + midpoint,
        (g - midpoint) * factor + midpoint,
        (b - midpoint) * factor + midpoint,
    )
}

/// Gaussian blur with standard deviation `sigma` pixels.
fn apply_blur(working: &mut Vec<f32>, width: u32, height: u32, sigma: f32) {
    if working.len() != (width as usize) * (height as usize) * 3 {
        log::warn!("blur skipped: buffer does not match {}x{}", width, height);
        return;
    }
    if let Some(buffer) = image::Rgb32FImage::from_raw(width, height, std::mem::take(working)) {
        *working = image::imageops::blur(&buffer, sigma).into_raw();
    }
}
