//! Quarter-turn rotation.
//!
//! Magnets are only ever rotated in 90 degree steps, so rotation is an
//! exact pixel permutation with no resampling.
//!
//! # Algorithm
//!
//! Each output pixel is read from its source position (inverse mapping).
//! For a source of `w x h`, clockwise turns map as:
//! ```text
//!  90: dst(x, y) = src(y, h - 1 - x)
//! 180: dst(x, y) = src(w - 1 - x, h - 1 - y)
//! 270: dst(x, y) = src(w - 1 - y, x)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodedImage;

/// Rotation angle that is not a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rotation must be a multiple of 90 degrees, got {0}")]
pub struct InvalidRotation(pub i32);

/// Clockwise rotation applied at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Angle in degrees (0, 90, 180 or 270).
    pub fn degrees(self) -> i32 {
        self.quarter_turns() as i32 * 90
    }

    /// Number of clockwise quarter turns.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            3 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Normalize any multiple of 90 degrees (negative = counter-clockwise).
    pub fn from_degrees(degrees: i32) -> Result<Self, InvalidRotation> {
        if degrees % 90 != 0 {
            return Err(InvalidRotation(degrees));
        }
        Ok(Self::from_quarter_turns(degrees / 90))
    }

    /// One quarter turn clockwise; four calls return to the start.
    pub fn rotate_cw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() as i32 + 1)
    }

    /// One quarter turn counter-clockwise.
    pub fn rotate_ccw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() as i32 - 1)
    }

    /// True for 90 and 270, which exchange width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<i32> for Rotation {
    type Error = InvalidRotation;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
    }
}

/// Dimensions of a `width x height` image after `rotation`.
pub fn rotated_dimensions(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Rotate an image clockwise by quarter turns. Empty or malformed bitmaps
/// come back unchanged.
pub fn apply_rotation(image: &DecodedImage, rotation: Rotation) -> DecodedImage {
    if rotation == Rotation::Deg0 || image.is_empty() || !image.has_valid_buffer() {
        return image.clone();
    }

    let (sw, sh) = (image.width as usize, image.height as usize);
    let (dw, dh) = rotated_dimensions(image.width, image.height, rotation);
    let (dw, dh) = (dw as usize, dh as usize);
    let mut output = vec![0u8; dw * dh * 3];

    for dy in 0..dh {
        for dx in 0..dw {
            let (sx, sy) = match rotation {
                Rotation::Deg90 => (dy, sh - 1 - dx),
                Rotation::Deg180 => (sw - 1 - dx, sh - 1 - dy),
                Rotation::Deg270 => (sw - 1 - dy, dx),
                Rotation::Deg0 => (dx, dy),
            };
            let src = (sy * sw + sx) * 3;
            let dst = (dy * dw + dx) * 3;
            output[dst..dst + 3].copy_from_slice(&image.pixels[src..src + 3]);
        }
    }

    DecodedImage::new(dw as u32, dh as u32, output)
}
