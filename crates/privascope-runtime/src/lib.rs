//! # privascope-runtime
//!
//! Sequential assessment pipeline runtime.
//!
//! This crate runs the fixed stage order Fetch → Explain → Extract →
//! Assess → Assemble over one append-only context per run, talking to a
//! generative completion backend for the three generative stages.
//!
//! ## Guarantees
//!
//! - **Fail-fast**: the first stage failure aborts the run; no partial
//!   report is ever produced
//! - **Validated composition**: every stage declares its required and
//!   produced context keys, checked before each invocation
//! - **Bounded network**: every fetch and completion call carries a
//!   timeout; transient completion failures get exactly one retry
//! - **Shared-nothing runs**: concurrent runs share only the pooled,
//!   thread-safe completion client and fetcher
//!
//! ## Example
//!
//! ```rust,ignore
//! use privascope_runtime::{AssessmentPipeline, AssessmentRequest, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env()?;
//! let pipeline = AssessmentPipeline::standard(&config)?;
//!
//! let report = pipeline
//!     .assess(AssessmentRequest {
//!         url: "https://example.com/privacy".into(),
//!         regulation: "GDPR".into(),
//!         principle: "data minimization".into(),
//!     })
//!     .await?;
//! println!("{}", report.render());
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod stage;
pub mod stages;
pub mod usage;

// Re-export main types at crate root
pub use client::{ClientError, CompletionClient, ModelError, PromptTemplate, TemplateError};
pub use config::{ConfigError, RuntimeConfig};
pub use fetcher::{FetchError, HttpPolicyFetcher, ParseError, PolicyFetcher};
pub use orchestrator::{Orchestrator, PipelineError};
pub use pipeline::{AssessmentPipeline, AssessmentPipelineBuilder, AssessmentRequest};
pub use providers::{
    ChatMessage, CompletionBackend, CompletionConfig, CompletionResponse, GeminiBackend,
    ProviderError, TokenUsage,
};
pub use stage::{Capability, Stage, StageError};
pub use usage::{TemplateUsage, UsageTracker};
