//! Fail-fast sequential executor for the assessment pipeline.
//!
//! The orchestrator runs an ordered stage list against one context:
//! - Validate each stage's declared inputs before invoking it
//! - Reject a stage whose declared outputs would overwrite existing keys
//! - Merge produced pairs back into the context, collision-checked
//! - Abort on the first failure; no downstream stage runs, no partial
//!   report is produced
//!
//! This is a strict total-order state machine: no branching, no retries at
//! the orchestration level. Retries, if any, live inside a stage's own
//! backend invocation.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use privascope_core::{Context, Report, ReportAssembler};

use crate::stage::{Stage, StageError};

/// A pipeline run aborted at a specific stage.
#[derive(Error, Debug)]
#[error("stage '{stage}' failed: {cause}")]
pub struct PipelineError {
    /// Name of the failing stage.
    pub stage: &'static str,

    /// What went wrong inside it.
    #[source]
    pub cause: StageError,
}

impl PipelineError {
    fn new(stage: &'static str, cause: StageError) -> Self {
        Self { stage, cause }
    }
}

/// The fail-fast sequential executor.
///
/// Holds the ordered stage list and the final deterministic assembler;
/// both are process-wide configuration, shared across runs. Each call to
/// [`Orchestrator::run`] owns its context exclusively.
pub struct Orchestrator {
    stages: Vec<Arc<dyn Stage>>,
    assembler: ReportAssembler,
}

impl Orchestrator {
    /// Create an orchestrator over an ordered stage list.
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            stages,
            assembler: ReportAssembler::new(),
        }
    }

    /// Execute every stage in order against `context`, then assemble the
    /// report.
    ///
    /// Aborts on the first stage failure with the failing stage's name and
    /// cause. The downstream stages do not run and no report is produced.
    pub async fn run(&self, mut context: Context) -> Result<Report, PipelineError> {
        for stage in &self.stages {
            // Declared inputs must already exist.
            for key in stage.requires() {
                if !context.contains(key) {
                    return Err(PipelineError::new(
                        stage.name(),
                        StageError::MissingInput {
                            key: (*key).to_string(),
                        },
                    ));
                }
            }

            // Declared outputs must not overwrite prior evidence. Checked
            // before invocation so a misconfigured generative stage never
            // spends a backend call.
            for key in stage.produces() {
                if context.contains(key) {
                    return Err(PipelineError::new(
                        stage.name(),
                        StageError::KeyCollision {
                            key: (*key).to_string(),
                        },
                    ));
                }
            }

            debug!(
                stage = stage.name(),
                capability = ?stage.capability(),
                "running stage"
            );

            let outputs = stage
                .run(&context)
                .await
                .map_err(|cause| PipelineError::new(stage.name(), cause))?;

            for (key, value) in outputs {
                context.put(key, value).map_err(|err| {
                    PipelineError::new(stage.name(), collision_or_context(err))
                })?;
            }
        }

        let report = self
            .assembler
            .assemble(&context)
            .map_err(|err| PipelineError::new(ReportAssembler::NAME, collision_or_context(err)))?;

        info!(category = %report.category, "assessment assembled");
        Ok(report)
    }
}

/// Map a context merge failure onto the stage-error taxonomy.
fn collision_or_context(err: privascope_core::ContextError) -> StageError {
    match err {
        privascope_core::ContextError::KeyCollision { key } => StageError::KeyCollision { key },
        privascope_core::ContextError::MissingKey { key } => StageError::MissingInput { key },
        other => StageError::Context(other),
    }
}
