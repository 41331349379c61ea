//! Insight generators: the external source of industry insight content
//!
//! Implementations:
//! - `CommandGenerator`: runs an external program and parses its JSON output (production)
//! - `MockGenerator`: returns preconfigured responses (testing)
//! - `DisabledGenerator`: always unavailable, for setups with no generator configured
//!
//! Generation may be slow. The coordinator never calls a generator while
//! holding a store transaction.

use crate::model::InsightContent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::process::Command;

/// Errors from insight generation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("generator not available: {0}")]
    Unavailable(String),
    #[error("generation failed: {0}")]
    Failed(String),
    #[error("invalid generator response: {0}")]
    InvalidResponse(String),
}

/// Produces insight content for an industry.
///
/// Implementations must not write to the onboarding store.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, industry: &str) -> Result<InsightContent, GenerationError>;
}

/// Runs `<program> [args..] <industry>` and reads a JSON object from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the industry
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl InsightGenerator for CommandGenerator {
    async fn generate(&self, industry: &str) -> Result<InsightContent, GenerationError> {
        tracing::debug!(program = %self.program.display(), industry, "running insight generator");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(industry)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                GenerationError::Unavailable(format!("{}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        InsightContent::from_value(value).map_err(|other| {
            GenerationError::InvalidResponse(format!("expected a JSON object, got {}", other))
        })
    }
}

/// A generator that is never available.
#[derive(Debug, Clone)]
pub struct DisabledGenerator {
    reason: String,
}

impl DisabledGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl InsightGenerator for DisabledGenerator {
    async fn generate(&self, _industry: &str) -> Result<InsightContent, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }
}

/// Mock generator for testing; returns preconfigured responses.
#[derive(Default)]
pub struct MockGenerator {
    responses: HashMap<String, Result<InsightContent, GenerationError>>,
    fallback: Option<InsightContent>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content for a specific industry.
    pub fn with_response(mut self, industry: impl Into<String>, content: InsightContent) -> Self {
        self.responses.insert(industry.into(), Ok(content));
        self
    }

    /// Register a failure for a specific industry.
    pub fn with_failure(mut self, industry: impl Into<String>, error: GenerationError) -> Self {
        self.responses.insert(industry.into(), Err(error));
        self
    }

    /// Content returned for industries with no registered response.
    pub fn with_fallback(mut self, content: InsightContent) -> Self {
        self.fallback = Some(content);
        self
    }

    /// Number of `generate` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Industries requested, in call order
    pub fn requested(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InsightGenerator for MockGenerator {
    async fn generate(&self, industry: &str) -> Result<InsightContent, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(industry.to_string());
        }

        match (self.responses.get(industry), &self.fallback) {
            (Some(response), _) => response.clone(),
            (None, Some(content)) => Ok(content.clone()),
            (None, None) => Err(GenerationError::Unavailable(format!(
                "no mock response for industry '{}'",
                industry
            ))),
        }
    }
}

/// Helper to build `InsightContent` from key/value pairs in tests and demos.
pub fn content_from_pairs(pairs: Vec<(&str, serde_json::Value)>) -> InsightContent {
    InsightContent::new(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}
