//! Image decoding WASM bindings.
//!
//! - [`decode_image`] - Decode a JPEG, PNG or WebP upload with EXIF orientation applied
//! - [`probe_dimensions`] - Read width and height from an image header
//! - [`is_image_mime`] - Check a browser-reported MIME type
//! - [`resize`] - Resize an image to exact dimensions
//! - [`scale_to_cover`] - Upscale an image until it covers a minimum size
//!
//! ```typescript
//! import { decode_image, scale_to_cover } from '@photomagnet/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! const face = scale_to_cover(image, 100, 100, 2);
//! ```

use crate::types::{filter_from_u8, js_error, JsDecodedImage};
use photomagnet_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an uploaded image and correct its EXIF orientation.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// `[width, height]` from the image header, without decoding pixels.
#[wasm_bindgen]
pub fn probe_dimensions(bytes: &[u8]) -> Result<Vec<u32>, JsValue> {
    decode::probe_dimensions(bytes)
        .map(|(w, h)| vec![w, h])
        .map_err(js_error)
}

#[wasm_bindgen]
pub fn is_image_mime(mime: &str) -> bool {
    decode::is_image_mime(mime)
}

/// Resize an image to exact dimensions.
///
/// `filter`: 0 = Nearest, 1 = Bilinear, 2 = Lanczos3.
#[wasm_bindgen]
pub fn resize(image: &JsDecodedImage, width: u32, height: u32, filter: u8) -> Result<JsDecodedImage, JsValue> {
    decode::resize(&image.to_decoded()?, width, height, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Upscale until the image covers `min_width x min_height`. Larger images
/// come back unchanged.
#[wasm_bindgen]
pub fn scale_to_cover(
    image: &JsDecodedImage,
    min_width: u32,
    min_height: u32,
    filter: u8,
) -> Result<JsDecodedImage, JsValue> {
    decode::scale_to_cover(&image.to_decoded()?, min_width, min_height, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}
