//! Image encoding.
//!
//! Only JPEG is produced; PNG and WebP are accepted on input but every
//! rendering leaves the pipeline as `image/jpeg`.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError, JPEG_MIME};
