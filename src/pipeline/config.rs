//! Pipeline configuration.

use image::imageops::FilterType;

use crate::error::{Error, Result};
use crate::image::{BYTES_PER_PIXEL, DEFAULT_ROW_ALIGNMENT};

/// Configuration for the stylize pipeline.
///
/// The model input geometry and pixel layout come from the model itself;
/// this only controls how images are converted around it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Row alignment of encoded pixel buffers, in bytes.
    pub row_alignment: usize,

    /// Filter used to stretch the source image to the model input size.
    pub encode_filter: FilterType,

    /// Filter used to stretch the model output back to the source size.
    pub resize_filter: FilterType,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_alignment: DEFAULT_ROW_ALIGNMENT,
            encode_filter: FilterType::Lanczos3,
            resize_filter: FilterType::Lanczos3,
            output_quality: 95,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.row_alignment == 0 || self.row_alignment % BYTES_PER_PIXEL != 0 {
            return Err(Error::InvalidParameter {
                name: "row_alignment".to_string(),
                reason: format!("must be a non-zero multiple of {BYTES_PER_PIXEL}"),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}
