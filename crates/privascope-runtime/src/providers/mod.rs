//! Completion backend abstractions.
//!
//! This module defines the trait for generative text-completion backends
//! and the Gemini implementation the standard pipeline uses.
//!
//! ## Security
//!
//! All backends use the [`secrets`] module for credential handling. See
//! [`ApiCredential`] for the recommended patterns.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod gemini;
pub mod secrets;

pub use gemini::{GeminiBackend, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use secrets::{ApiCredential, CredentialSource, GEMINI_API_KEY_ENV, GOOGLE_API_KEY_ENV};

/// Errors from completion backends.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("response parse error: {0}")]
    Malformed(String),

    #[error("authentication failed")]
    Auth,

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("backend not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether this failure class is eligible for the single permitted
    /// retry. Timeouts, rate limits, transport errors, and server-side
    /// errors are transient; authentication and request-shape errors are
    /// not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Malformed(_)
            | ProviderError::Auth
            | ProviderError::NotConfigured(_) => false,
        }
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout: Duration::from_secs(15),
        }
    }
}

/// A chat message for completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model used
    pub model: String,

    /// Finish reason, if the backend reported one
    pub finish_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Backend abstraction allows swapping completion services.
///
/// Backends hold no per-run state: one instance, wrapped in an `Arc`, is
/// shared by every concurrent pipeline run.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Execute a completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}
