//! Synchronous encode, predict, decode and resize chain.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use image::{DynamicImage, GenericImageView};

use crate::error::Result;
use crate::image::{decode_pixel_buffer, encode_pixel_buffer_with, resize_image, EncodeOptions};
use crate::model::StyleModel;

use super::Config;

/// Wall-clock time spent in each stage of one invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub encode: Duration,
    pub predict: Duration,
    pub decode: Duration,
    pub resize: Duration,
}

impl StageTimings {
    #[must_use]
    pub fn total(&self) -> Duration {
        self.encode + self.predict + self.decode + self.resize
    }
}

/// A stylized image at the dimensions of its source.
#[derive(Debug, Clone)]
pub struct StylizedImage {
    pub image: DynamicImage,
    pub timings: StageTimings,
}

/// Runs a style model on whole images.
///
/// Every `predict` goes through a single gate, so one `Stylizer` shared by
/// many threads never enters its model concurrently. Share the `Stylizer`
/// (not the model) between callers that need this guarantee.
pub struct Stylizer {
    config: Config,
    model: Arc<dyn StyleModel>,
    gate: Mutex<()>,
}

impl Stylizer {
    /// Create a stylizer around an already loaded model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(model: Arc<dyn StyleModel>, config: Config) -> Result<Self> {
        config.validate()?;

        let (width, height) = model.input_size();
        tracing::info!(
            "Stylizer ready: model {} expects {width}x{height} {}",
            model.name(),
            model.input_format()
        );

        Ok(Self {
            config,
            model,
            gate: Mutex::new(()),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Stylize `image`, returning a result with the same dimensions.
    ///
    /// Any failing stage aborts the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed.
    pub fn stylize(&self, image: &DynamicImage) -> Result<StylizedImage> {
        let (src_width, src_height) = image.dimensions();
        let (width, height) = self.model.input_size();
        let mut timings = StageTimings::default();

        let options = EncodeOptions {
            width,
            height,
            format: self.model.input_format(),
            row_alignment: self.config.row_alignment,
            filter: self.config.encode_filter,
        };

        let started = Instant::now();
        let input = encode_pixel_buffer_with(image, &options)?;
        timings.encode = started.elapsed();

        let started = Instant::now();
        let output = {
            // The gate guards no data; poisoning is ignored.
            let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            self.model.predict(&input)?
        };
        timings.predict = started.elapsed();
        drop(input);

        let started = Instant::now();
        let decoded = DynamicImage::ImageRgba8(decode_pixel_buffer(&output)?);
        timings.decode = started.elapsed();

        let started = Instant::now();
        let image = resize_image(&decoded, src_width, src_height, self.config.resize_filter)?;
        timings.resize = started.elapsed();

        tracing::debug!(
            "Stylized {src_width}x{src_height} via {} (encode {:.2?}, predict {:.2?}, decode {:.2?}, resize {:.2?})",
            self.model.name(),
            timings.encode,
            timings.predict,
            timings.decode,
            timings.resize
        );

        Ok(StylizedImage { image, timings })
    }
}

impl std::fmt::Debug for Stylizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stylizer")
            .field("config", &self.config)
            .field("model", &self.model.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Stage};
    use crate::image::PixelBuffer;
    use crate::model::IdentityModel;
    use image::{Rgba, RgbaImage};

    struct FailingModel;

    impl StyleModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _input: &PixelBuffer) -> Result<PixelBuffer> {
            Err(Error::inference("failing", "malformed input"))
        }
    }

    fn identity_stylizer() -> Stylizer {
        Stylizer::new(Arc::new(IdentityModel::new()), Config::default()).unwrap()
    }

    #[test]
    fn test_restores_source_dimensions() {
        let stylizer = identity_stylizer();
        let image = DynamicImage::new_rgb8(1200, 800);

        let styled = stylizer.stylize(&image).unwrap();
        assert_eq!(styled.image.dimensions(), (1200, 800));
    }

    #[test]
    fn test_small_source_upscales_then_downscales() {
        let stylizer = identity_stylizer();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba([0, 128, 255, 255])));

        let styled = stylizer.stylize(&image).unwrap().image.to_rgba8();
        assert_eq!(styled.dimensions(), (50, 50));

        let Rgba([r, g, b, a]) = *styled.get_pixel(25, 25);
        assert!(r <= 2 && g.abs_diff(128) <= 2 && b >= 253 && a == 255);
    }

    #[test]
    fn test_inference_failure_aborts() {
        let stylizer = Stylizer::new(Arc::new(FailingModel), Config::default()).unwrap();
        let err = stylizer.stylize(&DynamicImage::new_rgb8(10, 10)).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Predict));
    }

    #[test]
    fn test_encoding_failure_aborts() {
        let err = identity_stylizer()
            .stylize(&DynamicImage::new_rgb8(0, 0))
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Encode));
    }

    #[test]
    fn test_keeps_config() {
        let config = Config {
            output_quality: 80,
            ..Config::default()
        };
        let stylizer = Stylizer::new(Arc::new(IdentityModel::new()), config).unwrap();
        assert_eq!(stylizer.config().output_quality, 80);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            output_quality: 0,
            ..Config::default()
        };
        assert!(Stylizer::new(Arc::new(IdentityModel::new()), config).is_err());
    }
}
