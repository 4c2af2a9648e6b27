use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::variant::ModelVariant;
use crate::error::NativeError;

/// Engine configuration shared by every handle a factory creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub host: String,
    /// 0 picks a free local port per engine
    pub port: u16,
    pub context_size: u32,
    pub threads: u32,
    pub health_timeout_seconds: u64,
    pub generate_timeout_seconds: u64,
    pub gptj_binary: Option<PathBuf>,
    pub llama_binary: Option<PathBuf>,
    /// Attach to an already running engine server instead of spawning one
    pub server_url: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            context_size: 2048,
            threads: 4,
            health_timeout_seconds: 60,
            generate_timeout_seconds: 600,
            gptj_binary: None,
            llama_binary: None,
            server_url: None,
        }
    }
}

impl RuntimeConfig {
    pub fn binary_for(&self, variant: ModelVariant) -> Option<&Path> {
        match variant {
            ModelVariant::GPTJ => self.gptj_binary.as_deref(),
            ModelVariant::LLaMA => self.llama_binary.as_deref(),
        }
    }
}

/// Options for a single `generate` call.
///
/// Only `verbose` is interpreted here. Everything in `params` belongs to the
/// native engine and is handed over as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

fn default_verbose() -> bool {
    true
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
            params: Map::new(),
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn n_predict(self, n: u32) -> Self {
        self.param("n_predict", n)
    }

    pub fn temperature(self, temperature: f32) -> Self {
        self.param("temperature", temperature)
    }

    pub fn top_k(self, k: u32) -> Self {
        self.param("top_k", k)
    }

    pub fn top_p(self, p: f32) -> Self {
        self.param("top_p", p)
    }

    pub fn repeat_penalty(self, penalty: f32) -> Self {
        self.param("repeat_penalty", penalty)
    }

    pub fn repeat_last_n(self, n: u32) -> Self {
        self.param("repeat_last_n", n)
    }

    /// Apply a `key=value` override. The value is read as a JSON literal when
    /// it parses as one, otherwise kept as a string.
    pub fn parse_param(self, pair: &str) -> Result<Self, String> {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty option name in '{}'", pair));
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        if key == "verbose" {
            let verbose = value
                .as_bool()
                .ok_or_else(|| format!("verbose must be true or false, got '{}'", raw))?;
            return Ok(self.verbose(verbose));
        }
        Ok(self.param(key, value))
    }
}

/// The two operations a native backend provides.
pub trait NativeEngine: Send {
    fn load_model(&mut self, path: &Path) -> Result<(), NativeError>;

    fn generate(&mut self, prompt: &str, params: &Map<String, Value>) -> Result<String, NativeError>;

    fn metadata(&self) -> RuntimeMetadata;
}

/// Builds a fresh engine for a resolved variant.
pub trait EngineFactory {
    fn create(&self, variant: ModelVariant) -> Box<dyn NativeEngine>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeMetadata {
    pub variant: ModelVariant,
    pub runtime_name: String,
    pub base_url: Option<String>,
}
