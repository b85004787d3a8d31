//! Stage contract for the assessment pipeline.

use async_trait::async_trait;
use thiserror::Error;

use privascope_core::{Context, ContextError, Value};

use crate::client::{ClientError, ModelError, TemplateError};
use crate::fetcher::{FetchError, ParseError};

/// Whether a stage's transform is pure or depends on a generative backend
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Deterministic,
    Generative,
}

/// Errors raised within a stage (or on its behalf by the orchestrator).
///
/// Every variant aborts the run; no stage recovers another stage's failure.
#[derive(Error, Debug)]
pub enum StageError {
    /// A required context key was absent at invocation time.
    #[error("required context key '{key}' is missing")]
    MissingInput { key: String },

    /// The stage attempted to produce a key already present in the context.
    #[error("stage attempted to overwrite context key '{key}'")]
    KeyCollision { key: String },

    /// The policy could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The policy page could not be reduced to plain text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Prompt substitution failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The generative backend failed after the one permitted retry.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Context access failed inside the stage body.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<ClientError> for StageError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Template(e) => StageError::Template(e),
            ClientError::Model(e) => StageError::Model(e),
        }
    }
}

impl StageError {
    /// Short kind name for user-visible failure summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::MissingInput { .. } => "validation",
            StageError::KeyCollision { .. } => "key collision",
            StageError::Fetch(_) => "fetch",
            StageError::Parse(_) => "parse",
            StageError::Template(_) => "template",
            StageError::Model(_) => "model",
            StageError::Context(_) => "context",
        }
    }
}

/// A named pipeline step with declared inputs and outputs.
///
/// # Contract
/// - `requires` keys are validated present before `run` is invoked; a stage
///   may assume they exist
/// - `produces` keys must be disjoint from keys already in the context at
///   call time; the orchestrator rejects the stage before invocation
///   otherwise
/// - stages receive a read-only context view and return produced pairs; the
///   orchestrator performs the merge
/// - stages hold no per-run state, so one stage instance serves any number
///   of concurrent runs
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name, as reported in pipeline errors.
    fn name(&self) -> &'static str;

    /// Context keys that must exist before this stage runs.
    fn requires(&self) -> &'static [&'static str];

    /// Context keys this stage returns from `run`.
    fn produces(&self) -> &'static [&'static str];

    /// Deterministic or generative.
    fn capability(&self) -> Capability;

    /// Execute the stage against a read-only view of the context.
    async fn run(&self, context: &Context) -> Result<Vec<(String, Value)>, StageError>;
}
