//! Puzzle piece layout.
//!
//! A puzzle magnet is one rendered image cut into a `grid x grid` set of
//! pieces. When the image size is not divisible by the grid, the leftover
//! pixels go to the first rows and columns so every pixel lands in exactly
//! one piece.

use crate::decode::DecodedImage;
use crate::transform::{crop_pixels, CropRegion};

/// Split `length` into `parts` spans whose lengths differ by at most one.
fn spans(length: u32, parts: u32) -> Vec<(u32, u32)> {
    let base = length / parts;
    let extra = length % parts;
    let mut offset = 0;
    (0..parts)
        .map(|i| {
            let size = base + u32::from(i < extra);
            let span = (offset, size);
            offset += size;
            span
        })
        .collect()
}

/// Piece rectangles in row-major order.
///
/// Returns an empty list when `grid` is zero or larger than either side.
pub fn piece_regions(width: u32, height: u32, grid: u32) -> Vec<CropRegion> {
    if grid == 0 || grid > width || grid > height {
        return Vec::new();
    }
    let columns = spans(width, grid);
    let rows = spans(height, grid);
    rows.iter()
        .flat_map(|&(y, h)| columns.iter().map(move |&(x, w)| CropRegion::new(x, y, w, h)))
        .collect()
}

/// Cut an image into its puzzle pieces, row-major.
pub fn split_pieces(image: &DecodedImage, grid: u32) -> Vec<DecodedImage> {
    piece_regions(image.width, image.height, grid)
        .iter()
        .map(|region| crop_pixels(image, region))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: pieces tile the image with no gaps or overlaps.
        #[test]
        fn prop_pieces_tile_image(w in 1u32..=500, h in 1u32..=500, grid in 1u32..=6) {
            let regions = piece_regions(w, h, grid);
            if grid > w || grid > h {
                prop_assert!(regions.is_empty());
            } else {
                prop_assert_eq!(regions.len() as u32, grid * grid);
                let area: u64 = regions.iter().map(CropRegion::area).sum();
                prop_assert_eq!(area, w as u64 * h as u64);
                prop_assert!(regions.iter().all(|r| r.fits_within(w, h)));
            }
        }
    }
}
