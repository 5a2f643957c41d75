//! Style model boundary and its implementations.

mod identity;
mod loader;
mod onnx;

pub use identity::IdentityModel;
pub use loader::{ModelStore, MODEL_EXTENSION};
pub use onnx::{OnnxStyleModel, TensorRange};

use crate::error::Result;
use crate::image::{PixelBuffer, PixelFormat, MODEL_INPUT_SIZE};

/// A pre-trained style-transfer network treated as a black box.
///
/// Implementations receive one packed pixel buffer and return one packed
/// pixel buffer of model-defined size. They need not tolerate overlapping
/// calls: [`Stylizer`](crate::Stylizer) serializes every `predict` made
/// through it, so a model shared between threads is never entered twice.
pub trait StyleModel: Send + Sync {
    /// Human-readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Width and height of the buffer `predict` expects.
    fn input_size(&self) -> (u32, u32) {
        (MODEL_INPUT_SIZE, MODEL_INPUT_SIZE)
    }

    /// Packed layout of the buffer `predict` expects.
    fn input_format(&self) -> PixelFormat {
        PixelFormat::Argb32
    }

    /// Run the model on a single input buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`](crate::Error::Inference) (or a shape
    /// mismatch) if the model cannot produce an output.
    fn predict(&self, input: &PixelBuffer) -> Result<PixelBuffer>;
}
