//! A model that returns its input unchanged.

use crate::error::Result;
use crate::image::{PixelBuffer, MODEL_INPUT_SIZE};

use super::StyleModel;

/// Echoes every input buffer back as output.
///
/// Useful for dry runs of the pipeline without a trained network.
#[derive(Debug, Clone)]
pub struct IdentityModel {
    input_size: (u32, u32),
}

impl IdentityModel {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input_size: (MODEL_INPUT_SIZE, MODEL_INPUT_SIZE),
        }
    }

    /// Expect inputs of `width` x `height` instead of the default.
    #[must_use]
    pub const fn with_input_size(width: u32, height: u32) -> Self {
        Self {
            input_size: (width, height),
        }
    }
}

impl Default for IdentityModel {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleModel for IdentityModel {
    fn name(&self) -> &str {
        "identity"
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn predict(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(input.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    #[test]
    fn test_identity_echoes_input() {
        let mut input = PixelBuffer::new(3, 3, PixelFormat::Argb32, 16).unwrap();
        input.as_bytes_mut()[5] = 42;

        let output = IdentityModel::new().predict(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_identity_input_size() {
        assert_eq!(IdentityModel::new().input_size(), (700, 700));
        assert_eq!(IdentityModel::with_input_size(64, 32).input_size(), (64, 32));
    }
}
