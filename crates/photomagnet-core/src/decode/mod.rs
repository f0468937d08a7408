//! Image decoding pipeline.
//!
//! This module provides functionality for:
//! - Validating customer uploads (MIME type, size ceiling)
//! - Decoding JPEG, PNG and WebP with EXIF orientation correction
//! - Pre-scaling decoded images so they cover a product's render size
//!
//! # Architecture
//!
//! All operations are synchronous and single-threaded. The upload session
//! wraps them in jobs so the host can run them off the UI thread.

mod raster;
mod resize;
mod types;
mod upload;

pub use raster::{decode_image, decode_source, get_orientation, probe_dimensions};
pub use resize::{cover_dimensions, cover_scale, resize, scale_to_cover, scaled_dimensions};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation, SourceImage};
pub use upload::{is_image_mime, validate_upload, UploadError, UploadFile};
