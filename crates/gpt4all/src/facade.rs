//! GPT4All façade
//!
//! One value per model file. Construction resolves the backend variant and
//! loads the model; either both succeed or no `GPT4All` exists.

use crate::diagnostics::{DiagnosticSink, StdoutSink};
use crate::error::Result;
use crate::model_runtime::{
    EngineFactory, GenerateOptions, ModelHandle, ModelResolver, ModelVariant, RuntimeConfig,
    RuntimeMetadata, ServerEngineFactory,
};
use crate::prompt::{ConversationMessage, PromptAssembler, PromptOptions, Role};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    /// Counts are character counts of the prompt and the response text.
    pub fn from_text(prompt: &str, response: &str) -> Self {
        let prompt_tokens = prompt.chars().count();
        let completion_tokens = response.chars().count();
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

/// Result of [`GPT4All::chat_completion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub usage: Usage,
    pub choices: Vec<Choice>,
}

impl ChatCompletion {
    fn new(prompt: &str, response: String) -> Self {
        Self {
            usage: Usage::from_text(prompt, &response),
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: response,
                },
            }],
        }
    }

    /// Text of the first choice.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default()
    }
}

/// Per-call options for [`GPT4All::chat_completion`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub prompt: PromptOptions,
    pub generate: GenerateOptions,
}

impl ChatOptions {
    pub fn header(mut self, enabled: bool) -> Self {
        self.prompt = self.prompt.header(enabled);
        self
    }

    pub fn footer(mut self, enabled: bool) -> Self {
        self.prompt = self.prompt.footer(enabled);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.generate = self.generate.verbose(verbose);
        self
    }
}

#[allow(clippy::upper_case_acronyms)]
pub struct GPT4All {
    model_path: PathBuf,
    handle: ModelHandle,
}

impl GPT4All {
    /// Load `model_path` with the server engine configured from the environment.
    ///
    /// `model_type` is required for files that are not in the known model list.
    pub fn new(model_path: impl AsRef<Path>, model_type: Option<&str>) -> Result<Self> {
        let factory = ServerEngineFactory::new(RuntimeConfig::from_env());
        Self::with_factory(model_path, model_type, &factory, Arc::new(StdoutSink))
    }

    pub fn with_factory(
        model_path: impl AsRef<Path>,
        model_type: Option<&str>,
        factory: &dyn EngineFactory,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let variant = ModelResolver::resolve(model_path, model_type)?;

        let mut handle = ModelHandle::with_sink(variant, factory.create(variant), sink);
        handle.load_model(model_path)?;

        info!("GPT4All ready: {} ({})", model_path.display(), variant.name());
        Ok(Self {
            model_path: model_path.to_path_buf(),
            handle,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn variant(&self) -> ModelVariant {
        self.handle.variant()
    }

    pub fn model_type(&self) -> &'static str {
        self.handle.model_type()
    }

    pub fn metadata(&self) -> RuntimeMetadata {
        self.handle.metadata()
    }

    pub fn generate(&mut self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        self.handle.generate(prompt, options)
    }

    pub fn chat_completion(
        &mut self,
        messages: &[ConversationMessage],
        options: &ChatOptions,
    ) -> Result<ChatCompletion> {
        let prompt = PromptAssembler::assemble(messages, &options.prompt);
        let response = self.handle.generate(&prompt, &options.generate)?;
        Ok(ChatCompletion::new(&prompt, response))
    }
}

impl std::fmt::Debug for GPT4All {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GPT4All")
            .field("model_path", &self.model_path)
            .field("handle", &self.handle)
            .finish()
    }
}
