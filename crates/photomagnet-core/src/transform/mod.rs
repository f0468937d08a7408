//! Geometric transforms: cropping and quarter-turn rotation.
//!
//! # Transform Order
//!
//! A magnet face is produced in this order:
//! 1. Crop (source pixel space, aspect-locked to the product)
//! 2. Scale to cover the render target
//! 3. Photometric adjustments
//! 4. Rotation
//!
//! # Coordinate System
//!
//! - Crop coordinates are whole source pixels
//! - Rotation is clockwise
//! - Origin is top-left corner

mod crop;
mod rotation;

pub use crop::{crop_pixels, rasterize, AspectRatio, CropRegion, CropSelector};
pub use rotation::{apply_rotation, rotated_dimensions, InvalidRotation, Rotation};
