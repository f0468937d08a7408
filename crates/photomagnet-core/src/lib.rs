//! Photomagnet Core - image composition library
//!
//! This crate provides the core functionality behind the Photomagnet
//! storefront: decoding customer uploads, cropping them to a product's
//! aspect ratio, applying rotation and photometric adjustments, re-encoding
//! print-ready renderings, and managing the per-slot upload session of a
//! multi-image product. The cart, checkout and admin boundaries the
//! storefront talks to live here as well.

pub mod adjustments;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod color_matrix;
pub mod compose;
pub mod config;
pub mod data_url;
pub mod decode;
pub mod encode;
pub mod puzzle;
pub mod session;
pub mod transform;

pub use compose::{render, RenderError, RenderTarget, RenderedImage};
pub use config::PipelineConfig;
pub use transform::{apply_rotation, crop_pixels, AspectRatio, CropRegion, CropSelector, Rotation};

/// Lowest value any adjustment channel accepts.
pub const ADJUSTMENT_MIN: f32 = 0.0;

/// Highest value any adjustment channel accepts.
pub const ADJUSTMENT_MAX: f32 = 200.0;

/// Photometric adjustments applied at render time.
///
/// Brightness, contrast, saturation and sepia are percentages; blur is a
/// radius in output pixels. Every channel is clamped to
/// [`ADJUSTMENT_MIN`]..=[`ADJUSTMENT_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// Brightness (100 = neutral)
    pub brightness: f32,
    /// Contrast (100 = neutral)
    pub contrast: f32,
    /// Saturation (100 = neutral)
    pub saturation: f32,
    /// Gaussian blur radius in pixels (0 = neutral)
    pub blur: f32,
    /// Sepia tone amount (0 = neutral, 100 = full sepia)
    pub sepia: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            sepia: 0.0,
        }
    }
}

impl Adjustments {
    /// Create adjustments at their identity values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Restore every channel to its identity value
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Read a single channel
    pub fn get(&self, channel: AdjustmentChannel) -> f32 {
        match channel {
            AdjustmentChannel::Brightness => self.brightness,
            AdjustmentChannel::Contrast => self.contrast,
            AdjustmentChannel::Saturation => self.saturation,
            AdjustmentChannel::Blur => self.blur,
            AdjustmentChannel::Sepia => self.sepia,
        }
    }

    /// Set a single channel, clamping it into range.
    ///
    /// Non-finite values reset the channel to neutral.
    pub fn set(&mut self, channel: AdjustmentChannel, value: f32) {
        let value = clamp_channel(value, channel.neutral());
        match channel {
            AdjustmentChannel::Brightness => self.brightness = value,
            AdjustmentChannel::Contrast => self.contrast = value,
            AdjustmentChannel::Saturation => self.saturation = value,
            AdjustmentChannel::Blur => self.blur = value,
            AdjustmentChannel::Sepia => self.sepia = value,
        }
    }

    /// Return a copy with every channel clamped into range
    pub fn clamped(self) -> Self {
        let mut out = Self::default();
        for channel in AdjustmentChannel::ALL {
            out.set(channel, self.get(channel));
        }
        out
    }
}

fn clamp_channel(value: f32, neutral: f32) -> f32 {
    if value.is_finite() {
        value.clamp(ADJUSTMENT_MIN, ADJUSTMENT_MAX)
    } else {
        neutral
    }
}

/// One independently controllable adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentChannel {
    Brightness,
    Contrast,
    Saturation,
    Blur,
    Sepia,
}

impl AdjustmentChannel {
    /// All channels in filter-chain order
    pub const ALL: [AdjustmentChannel; 5] = [
        AdjustmentChannel::Brightness,
        AdjustmentChannel::Contrast,
        AdjustmentChannel::Saturation,
        AdjustmentChannel::Blur,
        AdjustmentChannel::Sepia,
    ];

    /// The value at which this channel leaves pixels unchanged
    pub fn neutral(self) -> f32 {
        match self {
            AdjustmentChannel::Blur | AdjustmentChannel::Sepia => 0.0,
            _ => 100.0,
        }
    }

    /// Lowercase name used by UI controls
    pub fn name(self) -> &'static str {
        match self {
            AdjustmentChannel::Brightness => "brightness",
            AdjustmentChannel::Contrast => "contrast",
            AdjustmentChannel::Saturation => "saturation",
            AdjustmentChannel::Blur => "blur",
            AdjustmentChannel::Sepia => "sepia",
        }
    }

    /// Parse a channel from its UI name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.name().eq_ignore_ascii_case(name))
    }
}
