//! Local model store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{OnnxStyleModel, TensorRange};

/// File extension of model files in the store.
pub const MODEL_EXTENSION: &str = "onnx";

/// Resolves style models from explicit paths or a per-user model directory.
///
/// Models are never downloaded; they must already be present on disk.
#[derive(Debug, Clone)]
pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    /// Open the default model store.
    ///
    /// Uses the platform-appropriate data directory:
    /// - Windows: `%APPDATA%\stylize\models`
    /// - Linux: `~/.local/share/stylize/models`
    /// - macOS: `~/Library/Application Support/stylize/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the model directory cannot be created.
    pub fn new() -> Result<Self> {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_dir(base.join("stylize").join("models"))
    }

    /// Open a model store rooted at `model_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_dir<P: Into<PathBuf>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.into();

        fs::create_dir_all(&model_dir).map_err(|source| Error::ModelDir {
            path: model_dir.clone(),
            source,
        })?;

        Ok(Self { model_dir })
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Find the file for `model`.
    ///
    /// `model` may be a path to an existing file, a file name inside the
    /// store, or a bare name that gets the `.onnx` extension appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] listing every location tried.
    pub fn resolve(&self, model: &str) -> Result<PathBuf> {
        let candidates = [
            PathBuf::from(model),
            self.model_dir.join(model),
            self.model_dir.join(format!("{model}.{MODEL_EXTENSION}")),
        ];

        if let Some(found) = candidates.iter().find(|p| p.is_file()) {
            tracing::debug!("Resolved model {model} to {}", found.display());
            return Ok(found.clone());
        }

        Err(Error::ModelNotFound {
            name: model.to_string(),
            searched: candidates.to_vec(),
        })
    }

    /// Names of the models present in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn available(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.model_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == MODEL_EXTENSION) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolve and load an ONNX style model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be found or loaded.
    pub fn load(
        &self,
        model: &str,
        input_size: (u32, u32),
        range: TensorRange,
    ) -> Result<OnnxStyleModel> {
        let path = self.resolve(model)?;
        OnnxStyleModel::load(path, input_size, range)
    }
}
