//! Image resizing.
//!
//! Every product rendering must cover a minimum pixel size. These helpers
//! compute the uniform "cover" scale used throughout the pipeline and apply
//! it with the `image` crate's resamplers. All functions return new
//! `DecodedImage` instances without modifying the input.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if either target dimension is zero.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbImage".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Uniform scale that makes `width x height` cover `min_width x min_height`.
///
/// Never below 1.0: images that already cover the target are left at their
/// native resolution.
pub fn cover_scale(width: u32, height: u32, min_width: u32, min_height: u32) -> f64 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    let sx = min_width as f64 / width as f64;
    let sy = min_height as f64 / height as f64;
    sx.max(sy).max(1.0)
}

/// Dimensions after applying [`cover_scale`].
pub fn cover_dimensions(width: u32, height: u32, min_width: u32, min_height: u32) -> (u32, u32) {
    let scale = cover_scale(width, height, min_width, min_height);
    scaled_dimensions(width, height, scale)
}

/// Scale dimensions uniformly, rounding to whole pixels (minimum 1x1).
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale).round().max(1.0) as u32;
    let h = (height as f64 * scale).round().max(1.0) as u32;
    (w, h)
}

/// Upscale an image (preserving aspect ratio) until it covers the minimum
/// size. Images already large enough are returned unchanged.
pub fn scale_to_cover(
    image: &DecodedImage,
    min_width: u32,
    min_height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    let (w, h) = cover_dimensions(image.width, image.height, min_width, min_height);
    resize(image, w, h, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(128);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();
        assert_eq!((resized.width, resized.height), (50, 25));
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions_is_copy() {
        let img = create_test_image(30, 20);
        let resized = resize(&img, 30, 20, FilterType::Lanczos3).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = create_test_image(100, 50);
        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_cover_scale_never_shrinks() {
        assert_eq!(cover_scale(4000, 3000, 100, 100), 1.0);
    }

    #[test]
    fn test_cover_scale_uses_larger_ratio() {
        // 50x100 must cover 100x100: width ratio 2.0 dominates
        assert_eq!(cover_scale(50, 100, 100, 100), 2.0);
        assert_eq!(cover_dimensions(50, 100, 100, 100), (100, 200));
    }

    #[test]
    fn test_cover_dimensions_reach_target() {
        let (w, h) = cover_dimensions(33, 77, 100, 100);
        assert!(w >= 100 && h >= 100, "got {}x{}", w, h);
    }

    #[test]
    fn test_scale_to_cover_small_image() {
        let img = create_test_image(20, 10);
        let scaled = scale_to_cover(&img, 100, 100, FilterType::Bilinear).unwrap();
        assert_eq!((scaled.width, scaled.height), (200, 100));
    }

    #[test]
    fn test_scale_to_cover_large_image_untouched() {
        let img = create_test_image(300, 200);
        let scaled = scale_to_cover(&img, 100, 100, FilterType::Bilinear).unwrap();
        assert_eq!(scaled, img);
    }

    #[test]
    fn test_all_filter_types() {
        let img = create_test_image(100, 50);
        for filter in [
            FilterType::Nearest,
            FilterType::Bilinear,
            FilterType::Lanczos3,
        ] {
            let resized = resize(&img, 50, 25, filter).unwrap();
            assert_eq!((resized.width, resized.height), (50, 25));
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: cover dimensions always reach the requested minimum.
        #[test]
        fn prop_cover_reaches_minimum(
            (w, h) in (1u32..=2000, 1u32..=2000),
            (min_w, min_h) in (1u32..=600, 1u32..=600),
        ) {
            let (cw, ch) = cover_dimensions(w, h, min_w, min_h);
            prop_assert!(cw >= min_w, "{} < {}", cw, min_w);
            prop_assert!(ch >= min_h, "{} < {}", ch, min_h);
            prop_assert!(cw >= w && ch >= h);
        }
    }
}
