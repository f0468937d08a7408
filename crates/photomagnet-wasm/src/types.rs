//! WASM-compatible wrapper types for image data.
//!
//! These wrap the core bitmap and rendering types so JavaScript can hold
//! them, and convert between Rust and JavaScript representations.

use std::fmt::Display;

use photomagnet_core::decode::{DecodedImage, FilterType};
use photomagnet_core::RenderedImage;
use wasm_bindgen::prelude::*;

/// Convert any displayable error into the string `JsValue` JS code sees.
pub(crate) fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A decoded RGB bitmap held in WASM memory.
///
/// `pixels()` copies the data out to a `Uint8Array`; keep large images on
/// the WASM side and only extract pixels when needed.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create an image from dimensions and RGB pixel data (3 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// RGB pixel data as a `Uint8Array` copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// RGBA copy suitable for `new ImageData(...)`.
    pub fn rgba_pixels(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for rgb in self.pixels.chunks_exact(3) {
            out.extend_from_slice(rgb);
            out.push(u8::MAX);
        }
        out
    }

    /// Release WASM memory now instead of waiting for the finalizer.
    pub fn free(self) {}
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Copy back into a core bitmap, rejecting buffers that do not hold
    /// `width * height * 3` bytes.
    pub(crate) fn to_decoded(&self) -> Result<DecodedImage, JsValue> {
        DecodedImage::try_new(self.width, self.height, self.pixels.clone()).map_err(js_error)
    }
}

/// A finished JPEG rendering of one product face.
#[wasm_bindgen]
pub struct JsRenderedImage {
    inner: RenderedImage,
}

#[wasm_bindgen]
impl JsRenderedImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.inner.mime.clone()
    }

    /// Encoded bytes as a `Uint8Array` copy.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    /// `data:` URL for an `<img>` element or the cart.
    pub fn data_url(&self) -> String {
        self.inner.to_data_url()
    }

    pub fn from_data_url(url: &str) -> Result<JsRenderedImage, JsValue> {
        RenderedImage::from_data_url(url)
            .map(JsRenderedImage::from_rendered)
            .map_err(js_error)
    }
}

impl JsRenderedImage {
    pub(crate) fn from_rendered(inner: RenderedImage) -> Self {
        Self { inner }
    }
}

/// Map a u8 from JS onto a resize filter.
///
/// 0 = Nearest, 1 = Bilinear, 2 = Lanczos3. Anything else is Lanczos3, the
/// filter used for print renders.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        1 => FilterType::Bilinear,
        _ => FilterType::Lanczos3,
    }
}
