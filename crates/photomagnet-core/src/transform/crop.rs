//! Image cropping.
//!
//! Crop regions are expressed in source pixel coordinates. A [`CropSelector`]
//! owns the interactive crop box for one source image: every operation on it
//! returns a region that lies fully inside the source, honours the product's
//! aspect ratio and is never smaller than the minimum crop box.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner of the source
//! - `x + width <= source_width`, `y + height <= source_height`

use serde::{Deserialize, Serialize};

use crate::compose::RenderTarget;
use crate::decode::{resize, scaled_dimensions, DecodeError, DecodedImage, FilterType};

/// A rectangle in source pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a `width x height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check the region lies within a `width x height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }

    fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Fixed width:height ratio of a product face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// Build a ratio in lowest terms; `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let divisor = gcd(width, height);
        Some(Self {
            width: width / divisor,
            height: height / divisor,
        })
    }

    pub fn square() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// width / height
    pub fn value(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Largest `(w, h)` with this ratio that fits inside `max_w x max_h`.
    pub fn fit_within(&self, max_w: u32, max_h: u32) -> (u32, u32) {
        let ratio = self.value();
        if max_w as f64 / max_h as f64 > ratio {
            let w = ((max_h as f64) * ratio).round() as u32;
            (w.clamp(1, max_w), max_h)
        } else {
            let h = ((max_w as f64) / ratio).round() as u32;
            (max_w, h.clamp(1, max_h))
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Copy a region out of an image.
///
/// Regions extending past the image are clamped to it; the output is never
/// smaller than 1x1. Empty images and buffers that do not match their
/// dimensions come back unchanged.
pub fn crop_pixels(image: &DecodedImage, region: &CropRegion) -> DecodedImage {
    if image.is_empty() || !image.has_valid_buffer() {
        return image.clone();
    }
    if region.x == 0
        && region.y == 0
        && region.width >= image.width
        && region.height >= image.height
    {
        return image.clone();
    }

    let left = region.x.min(image.width.saturating_sub(1));
    let top = region.y.min(image.height.saturating_sub(1));
    let right = left.saturating_add(region.width).min(image.width);
    let bottom = top.saturating_add(region.height).min(image.height);

    let out_width = right.saturating_sub(left).max(1);
    let out_height = bottom.saturating_sub(top).max(1);

    let row_bytes = out_width as usize * 3;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    for y in top..top + out_height {
        let start = (y as usize * image.width as usize + left as usize) * 3;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    DecodedImage::new(out_width, out_height, output)
}

/// Interactive crop box over one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSelector {
    source_width: u32,
    source_height: u32,
    aspect: Option<AspectRatio>,
    min_width: u32,
    min_height: u32,
    max_width: u32,
    max_height: u32,
    region: CropRegion,
}

impl CropSelector {
    /// Start with the largest region satisfying `aspect`, centred.
    ///
    /// `min_size` applies to the shorter side of the crop box. When the
    /// source is too small for it, the minimum shrinks to the largest
    /// fitting region.
    pub fn new(
        source_width: u32,
        source_height: u32,
        aspect: Option<AspectRatio>,
        min_size: u32,
    ) -> Self {
        let source_width = source_width.max(1);
        let source_height = source_height.max(1);
        let min_size = min_size.max(1);

        let (max_width, max_height) = match aspect {
            Some(ratio) => ratio.fit_within(source_width, source_height),
            None => (source_width, source_height),
        };

        let (min_width, min_height) = match aspect {
            Some(ratio) if ratio.value() >= 1.0 => {
                ((min_size as f64 * ratio.value()).round() as u32, min_size)
            }
            Some(ratio) => (min_size, (min_size as f64 / ratio.value()).round() as u32),
            None => (min_size, min_size),
        };

        let (min_width, min_height) = if aspect.is_some()
            && (min_width > max_width || min_height > max_height)
        {
            (max_width, max_height)
        } else {
            (min_width.min(max_width), min_height.min(max_height))
        };

        let region = CropRegion::new(
            (source_width - max_width) / 2,
            (source_height - max_height) / 2,
            max_width,
            max_height,
        );

        Self {
            source_width,
            source_height,
            aspect,
            min_width,
            min_height,
            max_width,
            max_height,
            region,
        }
    }

    /// Selector for a product face, using the configured minimum crop box.
    pub fn for_target(
        source_width: u32,
        source_height: u32,
        target: &RenderTarget,
        min_size: u32,
    ) -> Self {
        Self::new(source_width, source_height, target.aspect_ratio(), min_size)
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    pub fn aspect(&self) -> Option<AspectRatio> {
        self.aspect
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    pub fn min_dimensions(&self) -> (u32, u32) {
        (self.min_width, self.min_height)
    }

    pub fn max_dimensions(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// Replace the region. Size follows the requested width when an aspect
    /// ratio is fixed; position is clamped into the source.
    pub fn set_region(&mut self, requested: CropRegion) -> CropRegion {
        let (width, height) = self.constrain_size(requested.width as f64, requested.height as f64);
        self.region = self.constrain_position(requested.x as i64, requested.y as i64, width, height);
        self.region
    }

    /// Move the region by a pixel offset, stopping at the source edges.
    pub fn translate(&mut self, dx: i64, dy: i64) -> CropRegion {
        let CropRegion {
            x,
            y,
            width,
            height,
        } = self.region;
        self.region = self.constrain_position(x as i64 + dx, y as i64 + dy, width, height);
        self.region
    }

    /// Grow (`factor > 1`) or shrink the region keeping its centre.
    ///
    /// Non-positive or non-finite factors leave the region unchanged.
    pub fn scale_about_center(&mut self, factor: f64) -> CropRegion {
        if !(factor.is_finite() && factor > 0.0) {
            return self.region;
        }
        let (cx, cy) = self.region.center();
        let (width, height) = self.constrain_size(
            self.region.width as f64 * factor,
            self.region.height as f64 * factor,
        );
        let x = (cx - width as f64 / 2.0).round() as i64;
        let y = (cy - height as f64 / 2.0).round() as i64;
        self.region = self.constrain_position(x, y, width, height);
        self.region
    }

    /// Back to the initial centred maximum region.
    pub fn reset(&mut self) -> CropRegion {
        self.region = CropRegion::new(
            (self.source_width - self.max_width) / 2,
            (self.source_height - self.max_height) / 2,
            self.max_width,
            self.max_height,
        );
        self.region
    }

    /// Rasterize the current region, scaled uniformly so it covers the
    /// target's pixel size. A region with the target's aspect comes out at
    /// exactly the target size.
    pub fn confirm(
        &self,
        image: &DecodedImage,
        target: &RenderTarget,
        filter: FilterType,
    ) -> Result<DecodedImage, DecodeError> {
        if (image.width, image.height) != (self.source_width, self.source_height) {
            log::warn!(
                "crop selector built for {}x{} used on {}x{} image",
                self.source_width,
                self.source_height,
                image.width,
                image.height
            );
        }
        rasterize(image, &self.region, target, filter)
    }

    fn constrain_size(&self, width: f64, height: f64) -> (u32, u32) {
        let clamp_w = |w: f64| w.round().clamp(self.min_width as f64, self.max_width as f64) as u32;
        match self.aspect {
            Some(ratio) => {
                let w = clamp_w(width);
                let h = (w as f64 / ratio.value()).round() as u32;
                (w, h.clamp(self.min_height.max(1), self.max_height))
            }
            None => {
                let h = height
                    .round()
                    .clamp(self.min_height as f64, self.max_height as f64) as u32;
                (clamp_w(width), h)
            }
        }
    }

    fn constrain_position(&self, x: i64, y: i64, width: u32, height: u32) -> CropRegion {
        let max_x = (self.source_width - width) as i64;
        let max_y = (self.source_height - height) as i64;
        CropRegion::new(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32, width, height)
    }
}

/// Crop `region` out of `image` and scale it to cover the target's pixel size.
pub fn rasterize(
    image: &DecodedImage,
    region: &CropRegion,
    target: &RenderTarget,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if image.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    image.check_buffer()?;

    let cropped = crop_pixels(image, region);
    let (tw, th) = (target.pixel_width().max(1), target.pixel_height().max(1));

    let scale = (tw as f64 / cropped.width as f64).max(th as f64 / cropped.height as f64);
    let (w, h) = scaled_dimensions(cropped.width, cropped.height, scale);

    log::debug!(
        "crop {}x{}+{}+{} -> {}x{}",
        region.width,
        region.height,
        region.x,
        region.y,
        w.max(tw),
        h.max(th)
    );
    resize(&cropped, w.max(tw), h.max(th), filter)
}
