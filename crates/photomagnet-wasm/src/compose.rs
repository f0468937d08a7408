//! Rendering bindings: scale, filter, rotate and encode one face.

use crate::adjustments::JsAdjustments;
use crate::types::{js_error, JsDecodedImage, JsRenderedImage};
use photomagnet_core::transform::Rotation;
use photomagnet_core::{render as core_render, PipelineConfig, RenderTarget};
use wasm_bindgen::prelude::*;

/// Render a cropped bitmap for a `width x height` face.
///
/// `config` is an optional plain object matching `PipelineConfig`
/// (camelCase keys); missing keys take their defaults.
#[wasm_bindgen]
pub fn render(
    image: &JsDecodedImage,
    rotation_degrees: i32,
    adjustments: &JsAdjustments,
    width: u32,
    height: u32,
    config: JsValue,
) -> Result<JsRenderedImage, JsValue> {
    let config = config_from_js(config)?;
    let rotation = Rotation::from_degrees(rotation_degrees).map_err(js_error)?;
    let target = RenderTarget::new(width, height, config.oversampling);
    core_render(&image.to_decoded()?, rotation, adjustments.inner(), &target, &config)
        .map(JsRenderedImage::from_rendered)
        .map_err(js_error)
}

/// Read a `PipelineConfig` from JS, treating `undefined`/`null` as defaults.
pub(crate) fn config_from_js(value: JsValue) -> Result<PipelineConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(PipelineConfig::default());
    }
    let config: PipelineConfig = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
    Ok(config.validated())
}
