//! Model runtime
//!
//! Selects a backend variant for a model and mediates the two operations
//! the native engine offers (`load_model`, `generate`).
//!
//! Architecture:
//! - `resolver` maps a type tag or file name to a closed set of variants
//! - `handle` guards the unloaded/loaded lifecycle around one engine
//! - `server_runtime` is the default engine: a local inference server
//!   process per handle, reached over HTTP
pub mod runtime_trait;
pub mod variant;
pub mod resolver;
pub mod handle;
pub mod server_runtime;
pub use runtime_trait::{EngineFactory, GenerateOptions, NativeEngine, RuntimeConfig, RuntimeMetadata};
pub use variant::ModelVariant;
pub use resolver::ModelResolver;
pub use handle::{HandleState, ModelHandle};
pub use server_runtime::{ServerEngine, ServerEngineFactory};
