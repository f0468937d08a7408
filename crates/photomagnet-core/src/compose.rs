//! Compositor: bitmap + rotation + adjustments -> print-ready JPEG.
//!
//! The physical product size (already converted to pixels) is multiplied
//! by the oversampling factor to get the output surface. The cropped bitmap
//! is scaled uniformly to cover that surface, filtered, rotated by quarter
//! turns and encoded at maximum quality.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adjustments::apply_adjustments;
use crate::config::PipelineConfig;
use crate::data_url::{parse_data_url, to_data_url};
use crate::decode::{cover_dimensions, probe_dimensions, resize, DecodeError, DecodedImage, FilterType};
use crate::encode::{encode_image, EncodeError, JPEG_MIME};
use crate::transform::{apply_rotation, AspectRatio, Rotation};
use crate::Adjustments;

/// Errors from rendering a slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Rendering was cancelled")]
    Cancelled,
}

/// Output size of one product face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTarget {
    /// Face width in pixels, before oversampling
    pub width: u32,
    /// Face height in pixels, before oversampling
    pub height: u32,
    /// Resolution multiplier
    pub oversampling: u32,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32, oversampling: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            oversampling: oversampling.max(1),
        }
    }

    pub fn pixel_width(&self) -> u32 {
        self.width.saturating_mul(self.oversampling)
    }

    pub fn pixel_height(&self) -> u32 {
        self.height.saturating_mul(self.oversampling)
    }

    /// The face's aspect ratio.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        AspectRatio::new(self.width, self.height)
    }
}

/// A finished rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    /// `data:image/jpeg;base64,...` form handed to the cart.
    pub fn to_data_url(&self) -> String {
        to_data_url(&self.mime, &self.bytes)
    }

    /// Rebuild from a data URL, reading dimensions from the image header.
    pub fn from_data_url(url: &str) -> Result<Self, DecodeError> {
        let (mime, bytes) = parse_data_url(url)?;
        let (width, height) = probe_dimensions(&bytes)?;
        Ok(Self {
            width,
            height,
            mime,
            bytes,
        })
    }
}

/// Output surface size for a `width x height` bitmap, before rotation.
pub fn surface_dimensions(width: u32, height: u32, target: &RenderTarget) -> (u32, u32) {
    cover_dimensions(width, height, target.pixel_width(), target.pixel_height())
}

/// Scale, filter and rotate a bitmap onto its output surface.
pub fn compose(
    bitmap: &DecodedImage,
    rotation: Rotation,
    adjustments: &Adjustments,
    target: &RenderTarget,
    filter: FilterType,
) -> Result<DecodedImage, RenderError> {
    if bitmap.is_empty() {
        return Err(DecodeError::InvalidFormat.into());
    }

    let (w, h) = surface_dimensions(bitmap.width, bitmap.height, target);
    let mut surface = resize(bitmap, w, h, filter)?;
    apply_adjustments(&mut surface, adjustments);
    Ok(apply_rotation(&surface, rotation))
}

/// Compose and encode to JPEG.
pub fn render(
    bitmap: &DecodedImage,
    rotation: Rotation,
    adjustments: &Adjustments,
    target: &RenderTarget,
    config: &PipelineConfig,
) -> Result<RenderedImage, RenderError> {
    let surface = compose(bitmap, rotation, adjustments, target, config.resize_filter)?;
    let bytes = encode_image(&surface, config.jpeg_quality)?;

    log::debug!(
        "rendered {}x{} (rotation {}, adjustments default: {})",
        surface.width,
        surface.height,
        rotation.degrees(),
        adjustments.is_default()
    );

    Ok(RenderedImage {
        width: surface.width,
        height: surface.height,
        mime: JPEG_MIME.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig {
            resize_filter: FilterType::Bilinear,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_target_pixel_size() {
        let target = RenderTarget::new(50, 40, 2);
        assert_eq!((target.pixel_width(), target.pixel_height()), (100, 80));
        assert_eq!(RenderTarget::new(0, 0, 0), RenderTarget::new(1, 1, 1));
    }

    #[test]
    fn test_surface_upscales_small_bitmap() {
        let target = RenderTarget::new(50, 50, 2);
        assert_eq!(surface_dimensions(40, 40, &target), (100, 100));
        assert_eq!(surface_dimensions(50, 100, &target), (100, 200));
    }

    #[test]
    fn test_surface_keeps_large_bitmap() {
        let target = RenderTarget::new(50, 50, 2);
        assert_eq!(surface_dimensions(640, 480, &target), (640, 480));
    }

    #[test]
    fn test_render_meets_oversampled_size() {
        let bitmap = DecodedImage::filled(30, 30, [200, 100, 50]);
        let target = RenderTarget::new(50, 50, 2);
        let out = render(&bitmap, Rotation::Deg0, &Adjustments::default(), &target, &config()).unwrap();
        assert!(out.width >= 100 && out.height >= 100);
        assert_eq!(out.mime, "image/jpeg");
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_render_rotation_swaps_surface() {
        let bitmap = DecodedImage::filled(200, 100, [10, 20, 30]);
        let target = RenderTarget::new(50, 50, 2);
        let out = render(&bitmap, Rotation::Deg90, &Adjustments::default(), &target, &config()).unwrap();
        assert_eq!((out.width, out.height), (100, 200));

        let out = render(&bitmap, Rotation::Deg180, &Adjustments::default(), &target, &config()).unwrap();
        assert_eq!((out.width, out.height), (200, 100));
    }

    #[test]
    fn test_compose_applies_adjustments() {
        let bitmap = DecodedImage::filled(10, 10, [100, 100, 100]);
        let target = RenderTarget::new(10, 10, 1);
        let adj = Adjustments {
            brightness: 0.0,
            ..Default::default()
        };
        let out = compose(&bitmap, Rotation::Deg0, &adj, &target, FilterType::Nearest).unwrap();
        assert!(out.pixels.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_compose_empty_bitmap_fails() {
        let bitmap = DecodedImage::new(0, 0, vec![]);
        let target = RenderTarget::new(10, 10, 1);
        let result = compose(&bitmap, Rotation::Deg0, &Adjustments::default(), &target, FilterType::Nearest);
        assert_eq!(result, Err(RenderError::Decode(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_rendered_image_data_url_round_trip() {
        let bitmap = DecodedImage::filled(12, 8, [1, 2, 3]);
        let target = RenderTarget::new(12, 8, 1);
        let out = render(&bitmap, Rotation::Deg0, &Adjustments::default(), &target, &config()).unwrap();

        let url = out.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(RenderedImage::from_data_url(&url).unwrap(), out);
    }
}
