//! Image loading utilities.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// Load a source image from disk.
///
/// Any format the `image` crate can decode is accepted. The image is
/// returned as decoded; conversion to a model input happens later.
///
/// # Errors
///
/// Returns an error if the image cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = img.dimensions();
    tracing::debug!("Loaded {} ({width}x{height})", path.display());

    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        let err = load_image("does/not/exist.png").unwrap_err();
        match err {
            Error::ImageLoad { path, .. } => assert_eq!(path, Path::new("does/not/exist.png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        image::RgbImage::new(12, 7).save(&path).unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (12, 7));
    }
}
