//! Runtime configuration, resolved once at process start.
//!
//! Configuration errors are raised before any pipeline work begins; they
//! are deliberately outside the pipeline error taxonomy. Nothing here is
//! re-read mid-run.

use std::time::Duration;

use thiserror::Error;

use crate::providers::CompletionConfig;

/// Environment variable overriding the completion model.
pub const MODEL_ENV: &str = "PRIVASCOPE_MODEL";

/// Environment variable overriding the completion timeout (humantime
/// syntax, e.g. `15s`).
pub const COMPLETION_TIMEOUT_ENV: &str = "PRIVASCOPE_COMPLETION_TIMEOUT";

/// Environment variable overriding the fetch timeout.
pub const FETCH_TIMEOUT_ENV: &str = "PRIVASCOPE_FETCH_TIMEOUT";

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} not set: configure '{primary}' (or legacy '{legacy}') environment variable")]
    MissingCredential {
        name: &'static str,
        primary: &'static str,
        legacy: &'static str,
    },

    #[error("invalid duration in '{var}': {reason}")]
    InvalidDuration { var: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("pipeline component not configured: {0}")]
    MissingComponent(&'static str),
}

/// Process-wide runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Completion model name.
    pub model: String,

    /// Maximum tokens per completion.
    pub max_output_tokens: u32,

    /// Sampling temperature (0.0 keeps assessments reproducible).
    pub temperature: f32,

    /// Per-completion-request timeout.
    pub completion_timeout: Duration,

    /// Per-fetch-request timeout.
    pub fetch_timeout: Duration,

    /// Fixed backoff before the one permitted completion retry.
    pub retry_delay: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: crate::providers::DEFAULT_GEMINI_MODEL.to_string(),
            max_output_tokens: 1024,
            temperature: 0.0,
            completion_timeout: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_millis(250),
        }
    }
}

impl RuntimeConfig {
    /// Build a configuration from defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.model = model;
        }
        config.completion_timeout =
            duration_from_env(COMPLETION_TIMEOUT_ENV, config.completion_timeout)?;
        config.fetch_timeout = duration_from_env(FETCH_TIMEOUT_ENV, config.fetch_timeout)?;

        Ok(config)
    }

    /// The per-request completion configuration derived from this runtime
    /// configuration.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
            timeout: self.completion_timeout,
        }
    }
}

fn duration_from_env(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => humantime::parse_duration(&raw).map_err(|e| ConfigError::InvalidDuration {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
