//! Model handle
//!
//! Owns one native engine bound to one variant and guards its lifecycle:
//! a handle starts unloaded, becomes loaded through a successful
//! `load_model`, and only then accepts `generate` calls. A failed load is
//! final for that handle.

use super::runtime_trait::{GenerateOptions, NativeEngine, RuntimeMetadata};
use super::variant::ModelVariant;
use crate::diagnostics::{DiagnosticSink, StdoutSink};
use crate::error::{Gpt4AllError, NativeError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleState {
    Unloaded,
    Loaded { model_path: PathBuf },
    Failed { model_path: PathBuf },
}

pub struct ModelHandle {
    variant: ModelVariant,
    engine: Box<dyn NativeEngine>,
    state: HandleState,
    sink: Arc<dyn DiagnosticSink>,
}

impl ModelHandle {
    pub fn new(variant: ModelVariant, engine: Box<dyn NativeEngine>) -> Self {
        Self::with_sink(variant, engine, Arc::new(StdoutSink))
    }

    pub fn with_sink(
        variant: ModelVariant,
        engine: Box<dyn NativeEngine>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            variant,
            engine,
            state: HandleState::Unloaded,
            sink,
        }
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Type tag of the bound variant, e.g. `"gptj"`.
    pub fn model_type(&self) -> &'static str {
        self.variant.type_tag()
    }

    pub fn state(&self) -> &HandleState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, HandleState::Loaded { .. })
    }

    pub fn metadata(&self) -> RuntimeMetadata {
        self.engine.metadata()
    }

    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match &self.state {
            HandleState::Loaded { model_path } => {
                return Err(Gpt4AllError::AlreadyLoaded {
                    variant: self.variant,
                    path: model_path.clone(),
                })
            }
            HandleState::Failed { model_path } => {
                return Err(Gpt4AllError::LoadFailed {
                    variant: self.variant,
                    path: model_path.clone(),
                })
            }
            HandleState::Unloaded => {}
        }

        info!("Loading {} model: {}", self.variant.name(), path.display());
        let loaded = if path.exists() {
            self.engine.load_model(path)
        } else {
            Err(NativeError::new(format!("Model file not found: {}", path.display())))
        };

        if let Err(e) = loaded {
            error!("Failed to load {} model {}: {}", self.variant.name(), path.display(), e);
            self.state = HandleState::Failed {
                model_path: path.to_path_buf(),
            };
            return Err(Gpt4AllError::ModelLoad {
                variant: self.variant,
                path: path.to_path_buf(),
                source: e,
            });
        }

        self.state = HandleState::Loaded {
            model_path: path.to_path_buf(),
        };
        info!("✅ {} model loaded", self.variant.name());
        Ok(())
    }

    pub fn generate(&mut self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        if !self.is_loaded() {
            return Err(Gpt4AllError::ModelNotLoaded {
                variant: self.variant,
            });
        }

        if options.verbose {
            self.sink.prompt(prompt);
        }

        debug!(
            "Generating with {} backend ({} prompt chars, {} passthrough options)",
            self.variant.name(),
            prompt.chars().count(),
            options.params.len()
        );
        let response = self
            .engine
            .generate(prompt, &options.params)
            .map_err(Gpt4AllError::NativeGeneration)?;

        if options.verbose {
            self.sink.response(&response);
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("variant", &self.variant)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
