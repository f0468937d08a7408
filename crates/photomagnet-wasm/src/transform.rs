//! WASM bindings for rotation and crop operations.

use crate::types::{filter_from_u8, js_error, JsDecodedImage};
use photomagnet_core::transform::{
    apply_rotation as core_rotate, crop_pixels, AspectRatio, CropRegion, CropSelector, Rotation,
};
use photomagnet_core::{puzzle, RenderTarget};
use wasm_bindgen::prelude::*;

/// Rotate clockwise by a multiple of 90 degrees.
///
/// Any other angle is an error. The output swaps width and height for 90
/// and 270.
#[wasm_bindgen]
pub fn apply_rotation(image: &JsDecodedImage, degrees: i32) -> Result<JsDecodedImage, JsValue> {
    let rotation = Rotation::from_degrees(degrees).map_err(js_error)?;
    Ok(JsDecodedImage::from_decoded(core_rotate(&image.to_decoded()?, rotation)))
}

/// The next clockwise quarter turn, in degrees.
#[wasm_bindgen]
pub fn next_rotation(degrees: i32) -> Result<i32, JsValue> {
    Rotation::from_degrees(degrees)
        .map(|r| r.rotate_cw().degrees())
        .map_err(js_error)
}

/// Copy a pixel rectangle out of an image, clamped to its bounds.
#[wasm_bindgen]
pub fn crop(
    image: &JsDecodedImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<JsDecodedImage, JsValue> {
    let region = CropRegion::new(x, y, width, height);
    Ok(JsDecodedImage::from_decoded(crop_pixels(&image.to_decoded()?, &region)))
}

/// Cut an image into `grid x grid` puzzle pieces, row-major.
///
/// Empty when `grid` is 0 or larger than either side.
#[wasm_bindgen]
pub fn split_pieces(image: &JsDecodedImage, grid: u32) -> Result<js_sys::Array, JsValue> {
    Ok(puzzle::split_pieces(&image.to_decoded()?, grid)
        .into_iter()
        .map(|piece| JsValue::from(JsDecodedImage::from_decoded(piece)))
        .collect())
}

fn region_to_js(region: CropRegion) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&region).map_err(js_error)
}

/// Interactive crop box for a single image.
///
/// Every mutator returns the resulting region as `{x, y, width, height}`
/// after clamping to the source bounds, aspect ratio and minimum size.
#[wasm_bindgen]
pub struct JsCropSelector {
    inner: CropSelector,
}

#[wasm_bindgen]
impl JsCropSelector {
    /// `aspect_width`/`aspect_height` of 0 leave the box unconstrained.
    #[wasm_bindgen(constructor)]
    pub fn new(
        source_width: u32,
        source_height: u32,
        aspect_width: u32,
        aspect_height: u32,
        min_size: u32,
    ) -> JsCropSelector {
        let aspect = AspectRatio::new(aspect_width, aspect_height);
        Self {
            inner: CropSelector::new(source_width, source_height, aspect, min_size),
        }
    }

    pub fn region(&self) -> Result<JsValue, JsValue> {
        region_to_js(self.inner.region())
    }

    pub fn set_region(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<JsValue, JsValue> {
        region_to_js(self.inner.set_region(CropRegion::new(x, y, width, height)))
    }

    pub fn translate(&mut self, dx: i32, dy: i32) -> Result<JsValue, JsValue> {
        region_to_js(self.inner.translate(i64::from(dx), i64::from(dy)))
    }

    pub fn scale(&mut self, factor: f64) -> Result<JsValue, JsValue> {
        region_to_js(self.inner.scale_about_center(factor))
    }

    pub fn reset(&mut self) -> Result<JsValue, JsValue> {
        region_to_js(self.inner.reset())
    }

    /// Rasterize the current region to cover `width x height` times
    /// `oversampling` pixels.
    pub fn confirm(
        &self,
        image: &JsDecodedImage,
        width: u32,
        height: u32,
        oversampling: u32,
        filter: u8,
    ) -> Result<JsDecodedImage, JsValue> {
        let target = RenderTarget::new(width, height, oversampling);
        self.inner
            .confirm(&image.to_decoded()?, &target, filter_from_u8(filter))
            .map(JsDecodedImage::from_decoded)
            .map_err(js_error)
    }
}

impl JsCropSelector {
    pub(crate) fn current(&self) -> CropRegion {
        self.inner.region()
    }
}
