//! Image encoding WASM bindings.
//!
//! - [`encode_jpeg`] - Encode RGB pixel data to JPEG bytes
//! - [`encode_jpeg_from_image`] - Encode a JsDecodedImage to JPEG bytes
//! - [`to_data_url`] - Wrap encoded bytes in a base64 `data:` URL
//!
//! ```typescript
//! const jpeg = encode_jpeg_from_image(image, 100);
//! preview.src = to_data_url('image/jpeg', jpeg);
//! ```

use crate::types::{js_error, JsDecodedImage};
use photomagnet_core::{data_url, encode};
use wasm_bindgen::prelude::*;

/// Encode RGB pixel data (3 bytes per pixel, row-major) to JPEG.
///
/// Fails when the buffer length is not `width * height * 3` or either
/// dimension is zero. Quality is clamped to 1-100.
#[wasm_bindgen]
pub fn encode_jpeg(pixels: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, JsValue> {
    encode::encode_jpeg(pixels, width, height, quality).map_err(js_error)
}

#[wasm_bindgen]
pub fn encode_jpeg_from_image(image: &JsDecodedImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    encode::encode_image(&image.to_decoded()?, quality).map_err(js_error)
}

#[wasm_bindgen]
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    data_url::to_data_url(mime, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_from_image_creates_valid_jpeg() {
        let img = JsDecodedImage::new(10, 10, vec![128u8; 10 * 10 * 3]);
        let jpeg = encode::encode_image(&img.to_decoded().unwrap(), 90).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_to_data_url() {
        assert_eq!(to_data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}
