// gpt4all/crates/gpt4all/src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::model_runtime::RuntimeConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: Option<PathBuf>,
    pub model_type: Option<String>,
    pub model_dir: PathBuf,
    pub verbose: bool,
    pub runtime: RuntimeConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let model_dir = env::var("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        let model_path = env::var("MODEL_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|p| resolve_model_path(&p, &model_dir));

        let model_type = env::var("MODEL_TYPE").ok().filter(|t| !t.is_empty());

        let verbose = env::var("VERBOSE")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .context("VERBOSE must be true or false")?;

        Ok(Self {
            model_path,
            model_type,
            model_dir,
            verbose,
            runtime: RuntimeConfig::from_env(),
        })
    }

    /// Model path to open: an explicit path wins over `MODEL_PATH`, and both
    /// get the `MODEL_DIR` lookup for bare filenames.
    pub fn select_model_path(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(resolve_model_path(path, &self.model_dir)),
            None => self.model_path.clone(),
        }
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        match &self.model_path {
            Some(path) => info!("- Model Path: {}", path.display()),
            None => info!("- Model Path: <unset>"),
        }
        info!("- Model Type: {}", self.model_type.as_deref().unwrap_or("<from filename>"));
        info!("- Model Dir: {}", self.model_dir.display());
        info!("- Verbose: {}", self.verbose);
        info!("- Host: {}", self.runtime.host);
        info!("- Port: {}", if self.runtime.port == 0 { "auto".to_string() } else { self.runtime.port.to_string() });
        info!("- Context Size: {}", self.runtime.context_size);
        info!("- Threads: {}", self.runtime.threads);
        if let Some(url) = &self.runtime.server_url {
            info!("- Server URL: {}", url);
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by whatever is set in the environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let threads = match env::var("THREADS") {
            Ok(v) if v != "auto" => v.parse().unwrap_or_else(|_| {
                warn!("Invalid THREADS value '{}', auto-detecting", v);
                auto_detect_threads()
            }),
            _ => auto_detect_threads(),
        };

        Self {
            host: env::var("GPT4ALL_HOST").unwrap_or(defaults.host),
            port: env_or("GPT4ALL_PORT", defaults.port),
            context_size: env_or("CTX_SIZE", defaults.context_size),
            threads,
            health_timeout_seconds: env_or("HEALTH_TIMEOUT_SECONDS", defaults.health_timeout_seconds),
            generate_timeout_seconds: env_or("GENERATE_TIMEOUT_SECONDS", defaults.generate_timeout_seconds),
            gptj_binary: env::var("GPTJ_BIN").ok().map(PathBuf::from),
            llama_binary: env::var("LLAMA_BIN").ok().map(PathBuf::from),
            server_url: env::var("GPT4ALL_SERVER_URL").ok().filter(|u| !u.is_empty()),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default", raw, key);
            default
        }),
        Err(_) => default,
    }
}

fn default_model_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".cache").join("gpt4all"))
        .unwrap_or_else(|_| PathBuf::from(".cache/gpt4all"))
}

/// A bare filename that is not found as given is looked up in `model_dir`.
pub fn resolve_model_path(model_path: impl AsRef<Path>, model_dir: &Path) -> PathBuf {
    let given = model_path.as_ref().to_path_buf();
    if given.exists() {
        return given;
    }

    let is_bare_name = given.parent().map_or(true, |p| p.as_os_str().is_empty());
    if is_bare_name {
        let candidate = model_dir.join(&given);
        if candidate.exists() {
            info!("Using model from model directory: {}", candidate.display());
            return candidate;
        }
    }

    warn!("Model file not found: {}", given.display());
    given
}

fn auto_detect_threads() -> u32 {
    let num_cpus = num_cpus::get() as u32;
    info!("Auto‑detected CPU cores: {}", num_cpus);
    threads_for_cores(num_cpus)
}

fn threads_for_cores(num_cpus: u32) -> u32 {
    match num_cpus {
        0..=2 => 1,
        3..=4 => (num_cpus * 2) / 3,
        5..=8 => (num_cpus * 3) / 5,
        9..=16 => num_cpus / 2,
        17..=32 => (num_cpus * 2) / 5,
        _ => 16,
    }
}
