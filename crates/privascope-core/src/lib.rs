//! # privascope-core
//!
//! Deterministic substrate of the Privascope assessment pipeline.
//!
//! This crate holds everything a pipeline run needs that does not touch the
//! network or a generative backend:
//! - the append-only [`Context`] threaded through one run
//! - the [`Report`] and its pure assembly from final context fields
//! - the total [`response`] parsers that reduce raw completion text to
//!   structured fields
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input always produces the same output
//! 2. **No network, no LLM calls**: everything here is pure computation
//! 3. **Append-only evidence**: a context entry, once written, is immutable
//!    for the rest of the run
//! 4. **Total parsing**: off-format backend output degrades to explicit
//!    fallback values instead of failing

pub mod context;
pub mod report;
pub mod response;

// Re-export main types at crate root
pub use context::{keys, Context, ContextError, Value};
pub use report::{AssessmentCategory, Report, ReportAssembler, DISCLAIMER};
pub use response::{parse_assessment, parse_explanation, parse_snippets, MAX_SNIPPETS};
