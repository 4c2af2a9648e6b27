//! Verbose output sinks
//!
//! With `verbose` set, the prompt is written before the native call and the
//! raw result after it. Where that text goes is up to the caller.

use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::info;

pub trait DiagnosticSink: Send + Sync {
    fn prompt(&self, prompt: &str);
    fn response(&self, response: &str);
}

/// Prints prompt and result to standard output. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn prompt(&self, prompt: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", prompt);
    }

    fn response(&self, response: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", response);
    }
}

/// Routes verbose output into `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn prompt(&self, prompt: &str) {
        info!(target: "gpt4all::prompt", "{}", prompt);
    }

    fn response(&self, response: &str) {
        info!(target: "gpt4all::response", "{}", response);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Prompt(String),
    Response(String),
}

/// Keeps everything it is given, in order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn prompt(&self, prompt: &str) {
        self.push(Diagnostic::Prompt(prompt.to_string()));
    }

    fn response(&self, response: &str) {
        self.push(Diagnostic::Response(response.to_string()));
    }
}
