//! Pipeline configuration.
//!
//! Every knob of the upload and render pipeline lives in [`PipelineConfig`].
//! The storefront passes it as a plain JSON object; missing fields fall back
//! to the defaults below.

use serde::{Deserialize, Serialize};

use crate::compose::RenderTarget;
use crate::decode::FilterType;

/// Upload ceiling per file (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Smallest crop box edge in source pixels.
pub const DEFAULT_MIN_CROP_SIZE: u32 = 100;

/// Render at twice the physical size to preserve print resolution.
pub const DEFAULT_OVERSAMPLING: u32 = 2;

/// JPEG quality used for every rendered image.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Settings shared by decoding, cropping and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Largest accepted upload in bytes
    pub max_file_bytes: usize,
    /// Minimum crop box edge in source pixels
    pub min_crop_size: u32,
    /// Multiplier applied to the product's pixel size before encoding
    pub oversampling: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Pixels per millimetre of physical product size
    pub pixels_per_mm: f64,
    /// Interpolation used when scaling bitmaps
    pub resize_filter: FilterType,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            min_crop_size: DEFAULT_MIN_CROP_SIZE,
            oversampling: DEFAULT_OVERSAMPLING,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            pixels_per_mm: 1.0,
            resize_filter: FilterType::Lanczos3,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with out-of-range values pulled back to something usable.
    pub fn validated(mut self) -> Self {
        if self.max_file_bytes == 0 {
            self.max_file_bytes = DEFAULT_MAX_FILE_BYTES;
        }
        self.min_crop_size = self.min_crop_size.max(1);
        self.oversampling = self.oversampling.max(1);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        if !(self.pixels_per_mm.is_finite() && self.pixels_per_mm > 0.0) {
            self.pixels_per_mm = 1.0;
        }
        self
    }

    /// Convert a physical size in millimetres into a render target.
    pub fn render_target(&self, width_mm: u32, height_mm: u32) -> RenderTarget {
        let to_px = |mm: u32| ((mm as f64) * self.pixels_per_mm).round().max(1.0) as u32;
        RenderTarget::new(to_px(width_mm), to_px(height_mm), self.oversampling)
    }

    /// Upload ceiling expressed in whole megabytes, for user-facing messages.
    pub fn max_file_megabytes(&self) -> usize {
        self.max_file_bytes / (1024 * 1024)
    }
}
