//! Server-backed native engine
//!
//! Runs the variant's inference server as a child process with the model
//! file and proxies `generate` calls to it over HTTP on localhost. Can also
//! attach to a server that is already running.

use super::runtime_trait::*;
use super::variant::ModelVariant;
use crate::error::NativeError;
use serde_json::{Map, Value};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ServerEngine {
    variant: ModelVariant,
    config: RuntimeConfig,
    server_process: Option<Child>,
    http_client: reqwest::blocking::Client,
    base_url: String,
}

impl ServerEngine {
    pub fn new(variant: ModelVariant, config: RuntimeConfig) -> Self {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.generate_timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            variant,
            config,
            server_process: None,
            http_client,
            base_url: String::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completion_url(&self) -> String {
        format!("{}/completion", self.base_url)
    }

    fn locate_binary(&self) -> Result<PathBuf, NativeError> {
        if let Some(path) = self.config.binary_for(self.variant) {
            if !path.exists() {
                return Err(NativeError::new(format!(
                    "{} server binary not found at: {}",
                    self.variant.name(),
                    path.display()
                )));
            }
            return Ok(path.to_path_buf());
        }

        let name = self.variant.default_server_binary();
        which::which(name).map_err(|e| {
            NativeError::new(format!(
                "No {} server binary configured and '{}' was not found on PATH: {}",
                self.variant.name(),
                name,
                e
            ))
        })
    }

    fn pick_port(&self) -> Result<u16, NativeError> {
        if self.config.port != 0 {
            return Ok(self.config.port);
        }
        let listener = TcpListener::bind((self.config.host.as_str(), 0))
            .map_err(|e| NativeError::new(format!("Failed to reserve a local port: {}", e)))?;
        listener
            .local_addr()
            .map(|addr| addr.port())
            .map_err(|e| NativeError::new(format!("Failed to reserve a local port: {}", e)))
    }

    fn start_server(&mut self, model_path: &Path) -> Result<(), NativeError> {
        let binary = self.locate_binary()?;
        let port = self.pick_port()?;

        info!("Starting {} server for model: {}", self.variant.name(), model_path.display());
        info!("  Binary: {}", binary.display());
        info!("  Port: {}", port);
        info!("  Context Size: {}", self.config.context_size);
        info!("  Threads: {}", self.config.threads);

        let mut cmd = Command::new(&binary);
        cmd.arg("--model").arg(model_path)
            .arg("--host").arg(&self.config.host)
            .arg("--port").arg(port.to_string())
            .arg("--ctx-size").arg(self.config.context_size.to_string())
            .arg("--threads").arg(self.config.threads.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| NativeError::new(format!("Failed to spawn {}: {}", binary.display(), e)))?;

        self.server_process = Some(child);
        self.base_url = format!("http://{}:{}", self.config.host, port);
        info!("{} server process started, waiting for health check...", self.variant.name());
        Ok(())
    }

    fn wait_until_ready(&mut self) -> Result<(), NativeError> {
        let timeout = Duration::from_secs(self.config.health_timeout_seconds);
        let started = Instant::now();

        loop {
            if let Some(child) = self.server_process.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    self.server_process = None;
                    return Err(NativeError::new(format!(
                        "{} server exited before becoming ready ({})",
                        self.variant.name(),
                        status
                    )));
                }
            }

            let remaining = timeout.saturating_sub(started.elapsed());
            if !remaining.is_zero() && self.check_health(remaining) {
                info!("✅ {} server ready after {:.1}s", self.variant.name(), started.elapsed().as_secs_f32());
                return Ok(());
            }

            if started.elapsed() >= timeout {
                self.stop_server();
                return Err(NativeError::new(format!(
                    "{} server at {} failed to become ready within {} seconds",
                    self.variant.name(),
                    self.base_url,
                    self.config.health_timeout_seconds
                )));
            }
            sleep(HEALTH_POLL_INTERVAL);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.check_health(Duration::from_secs(self.config.health_timeout_seconds))
    }

    /// Health probe bounded by `budget`, independent of the generate timeout.
    fn check_health(&self, budget: Duration) -> bool {
        if self.base_url.is_empty() {
            return false;
        }
        let health_url = format!("{}/health", self.base_url);
        match self.http_client.get(&health_url).timeout(budget).send() {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn stop_server(&mut self) {
        if let Some(mut child) = self.server_process.take() {
            match child.kill() {
                Ok(_) => {
                    debug!("{} server process killed", self.variant.name());
                    let _ = child.wait();
                }
                Err(e) => warn!("Failed to kill {} server process: {}", self.variant.name(), e),
            }
        }
    }
}

impl NativeEngine for ServerEngine {
    fn load_model(&mut self, path: &Path) -> Result<(), NativeError> {
        if !path.exists() {
            return Err(NativeError::new(format!("Model file not found: {}", path.display())));
        }

        match self.config.server_url.clone() {
            Some(url) => {
                info!("Attaching {} engine to running server at {}", self.variant.name(), url);
                self.base_url = url.trim_end_matches('/').to_string();
            }
            None => self.start_server(path)?,
        }

        self.wait_until_ready()
    }

    fn generate(&mut self, prompt: &str, params: &Map<String, Value>) -> Result<String, NativeError> {
        if self.base_url.is_empty() {
            return Err(NativeError::new(format!("{} engine has no running server", self.variant.name())));
        }

        let mut payload = params.clone();
        payload.insert("prompt".to_string(), Value::String(prompt.to_string()));

        let resp = self
            .http_client
            .post(self.completion_url())
            .json(&payload)
            .send()
            .map_err(|e| NativeError::new(format!("Inference request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(NativeError::new(format!("Inference failed ({}): {}", status, body)));
        }

        let response: Value = resp
            .json()
            .map_err(|e| NativeError::new(format!("Failed to parse response: {}", e)))?;

        response["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| NativeError::new(format!("Response has no content field: {}", response)))
    }

    fn metadata(&self) -> RuntimeMetadata {
        RuntimeMetadata {
            variant: self.variant,
            runtime_name: format!("{} ({})", self.variant.name(), self.variant.default_server_binary()),
            base_url: (!self.base_url.is_empty()).then(|| self.base_url.clone()),
        }
    }
}

impl Drop for ServerEngine {
    fn drop(&mut self) {
        self.stop_server();
    }
}

/// Builds a [`ServerEngine`] per variant from one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerEngineFactory {
    config: RuntimeConfig,
}

impl ServerEngineFactory {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl EngineFactory for ServerEngineFactory {
    fn create(&self, variant: ModelVariant) -> Box<dyn NativeEngine> {
        Box::new(ServerEngine::new(variant, self.config.clone()))
    }
}
