//! Custom error types for stylize.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the stylize library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Could not produce a model input buffer from the source image.
    #[error("failed to encode pixel buffer: {reason}")]
    Encoding { reason: String },

    /// The model call failed or produced no usable result.
    #[error("model {model} inference failed: {reason}")]
    Inference { model: String, reason: String },

    /// Could not reconstruct an image from the model's raw output.
    #[error("failed to decode pixel buffer: {reason}")]
    Decoding { reason: String },

    /// The final resize back to the source dimensions was impossible.
    #[error("failed to resize image: {reason}")]
    Resize { reason: String },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// No model file matched the requested path or name.
    #[error("model {name} not found (searched: {})", display_paths(.searched))]
    ModelNotFound { name: String, searched: Vec<PathBuf> },

    /// Failed to create the model store directory.
    #[error("failed to create model directory {path}: {source}")]
    ModelDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The background worker has shut down and cannot accept requests.
    #[error("stylize worker is no longer running")]
    WorkerUnavailable,

    /// The model or a pipeline stage panicked while handling a request.
    #[error("stylize request panicked: {reason}")]
    WorkerPanicked { reason: String },

    /// The main queue was dropped before a continuation could be posted.
    #[error("main queue is closed")]
    MainQueueClosed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stage an error originated from.
///
/// Callers that only care whether processing failed can collapse all of
/// these into a single outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Encode,
    Predict,
    Decode,
    Resize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Encode => "encode",
            Self::Predict => "predict",
            Self::Decode => "decode",
            Self::Resize => "resize",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Build an inference error for `model` from any displayable cause.
    pub fn inference(model: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Inference {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// The pipeline stage this error belongs to, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Encoding { .. } => Some(Stage::Encode),
            Self::Inference { .. } | Self::ShapeMismatch { .. } => Some(Stage::Predict),
            Self::Decoding { .. } => Some(Stage::Decode),
            Self::Resize { .. } => Some(Stage::Resize),
            _ => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for stylize operations.
pub type Result<T> = std::result::Result<T, Error>;
