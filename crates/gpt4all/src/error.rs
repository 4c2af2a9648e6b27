// gpt4all/crates/gpt4all/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use crate::model_runtime::ModelVariant;

/// Opaque failure reported by a native engine.
///
/// The engine owns its own error surface, so this layer only carries the
/// message through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by model resolution, loading and generation.
#[derive(Debug, Error)]
pub enum Gpt4AllError {
    #[error("No corresponding model for model_type: {tag}")]
    UnknownModelType { tag: String },

    #[error(
        "No corresponding model for provided filename {filename}. \
         If this is a custom model, make sure to specify a valid model_type."
    )]
    UnknownModelFile { filename: String },

    #[error("Failed to load {variant} model from {}: {source}", path.display())]
    ModelLoad {
        variant: ModelVariant,
        path: PathBuf,
        #[source]
        source: NativeError,
    },

    #[error("{variant} model is already loaded from {}", path.display())]
    AlreadyLoaded { variant: ModelVariant, path: PathBuf },

    #[error("{variant} model failed to load from {}; create a new handle to retry", path.display())]
    LoadFailed { variant: ModelVariant, path: PathBuf },

    #[error("{variant} model has not been loaded; call load_model first")]
    ModelNotLoaded { variant: ModelVariant },

    #[error("Native generation failed: {0}")]
    NativeGeneration(#[source] NativeError),
}

pub type Result<T> = std::result::Result<T, Gpt4AllError>;
