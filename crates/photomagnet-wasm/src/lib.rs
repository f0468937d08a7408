//! Photomagnet WASM - WebAssembly bindings for the storefront
//!
//! This crate exposes photomagnet-core to the TypeScript storefront.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrappers for bitmaps and renderings
//! - `decode` - Upload decoding and resizing
//! - `encode` - JPEG encoding and data URLs
//! - `transform` - Rotation, cropping and puzzle pieces
//! - `adjustments` - Brightness, contrast, saturation, blur and sepia
//! - `compose` - Rendering a finished face
//! - `session` - The multi-image upload session behind the product page
//! - `commerce` - Catalog, cart and checkout
//!
//! # Usage
//!
//! ```typescript
//! import init, { set_log_level, JsUploadSession, default_catalog } from '@photomagnet/wasm';
//!
//! await init();
//! set_log_level('debug');
//!
//! const [product] = default_catalog(new Date().toISOString());
//! const session = new JsUploadSession(product, undefined);
//! ```

use wasm_bindgen::prelude::*;

mod adjustments;
mod commerce;
mod compose;
mod decode;
mod encode;
mod logger;
mod session;
mod transform;
mod types;

pub use adjustments::{apply_adjustments, JsAdjustments};
pub use commerce::{apply_promo_code, default_catalog, required_images, JsCart, JsCheckout};
pub use compose::render;
pub use decode::{decode_image, is_image_mime, probe_dimensions, resize, scale_to_cover};
pub use encode::{encode_jpeg, encode_jpeg_from_image, to_data_url};
pub use session::JsUploadSession;
pub use transform::{apply_rotation, crop, next_rotation, split_pieces, JsCropSelector};
pub use types::{JsDecodedImage, JsRenderedImage};

/// Install the console logger at `info` (called automatically on load).
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
}

/// Change how much the core logs to the browser console.
///
/// Accepts `off`, `error`, `warn`, `info`, `debug` or `trace`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::install(logger::level_from_str(level));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
