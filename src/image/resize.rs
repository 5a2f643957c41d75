//! Final resize of stylized output back to the source geometry.

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// Stretch `img` to exactly `width` x `height`.
///
/// The pixel layout of the source is kept. Aspect ratio is not preserved.
///
/// # Errors
///
/// Returns [`Error::Resize`] if the source or destination has a zero
/// dimension.
pub fn resize_image(
    img: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DynamicImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == 0 || src_height == 0 {
        return Err(Error::Resize {
            reason: format!("source image is {src_width}x{src_height}"),
        });
    }
    if width == 0 || height == 0 {
        return Err(Error::Resize {
            reason: format!("target size {width}x{height} is empty"),
        });
    }

    if (src_width, src_height) == (width, height) {
        return Ok(img.clone());
    }

    tracing::debug!("Resizing {src_width}x{src_height} -> {width}x{height}");
    Ok(img.resize_exact(width, height, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_resize_to_original_dims() {
        let img = DynamicImage::new_rgba8(700, 700);
        let resized = resize_image(&img, 1200, 800, FilterType::Lanczos3).unwrap();

        assert_eq!(resized.dimensions(), (1200, 800));
        assert!(matches!(resized, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_resize_keeps_layout() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([9, 8, 7])));
        let resized = resize_image(&img, 3, 5, FilterType::Triangle).unwrap();

        assert!(matches!(resized, DynamicImage::ImageRgb8(_)));
        assert_eq!(resized.dimensions(), (3, 5));
    }

    #[test]
    fn test_resize_empty_source_is_an_error() {
        let img = DynamicImage::new_rgba8(0, 0);
        let err = resize_image(&img, 50, 50, FilterType::Lanczos3).unwrap_err();
        assert!(matches!(err, Error::Resize { .. }));
    }

    #[test]
    fn test_resize_empty_target_is_an_error() {
        let img = DynamicImage::new_rgba8(5, 5);
        let err = resize_image(&img, 50, 0, FilterType::Lanczos3).unwrap_err();
        assert!(matches!(err, Error::Resize { .. }));
    }
}
