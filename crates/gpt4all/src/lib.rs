// gpt4all/crates/gpt4all/src/lib.rs

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod model_runtime;
pub mod prompt;
pub mod telemetry;

// Public API exports
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, StdoutSink, TracingSink};
pub use error::{Gpt4AllError, NativeError, Result};
pub use facade::{ChatCompletion, ChatOptions, Choice, ChoiceMessage, Usage, GPT4All};
pub use model_runtime::{
    EngineFactory, GenerateOptions, HandleState, ModelHandle, ModelResolver, ModelVariant,
    NativeEngine, RuntimeConfig, RuntimeMetadata, ServerEngine, ServerEngineFactory,
};
pub use prompt::{ConversationMessage, PromptAssembler, PromptOptions, Role, PROMPT_FOOTER, PROMPT_HEADER};
