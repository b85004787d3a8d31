//! Assessment categories, the immutable report, and its deterministic
//! assembly from final context fields.

use std::fmt;

use serde::Serialize;

use crate::context::{keys, Context, ContextError};

/// Fixed disclaimer appended verbatim to every report.
///
/// No stage may paraphrase, trim, or reword this text; it is always the
/// final section of a rendered report.
pub const DISCLAIMER: &str = "This assessment was produced automatically from \
model-generated text. It is not legal advice, it may be incomplete or \
incorrect, and it must not be relied upon for compliance decisions. Consult \
qualified counsel before acting on any of its contents.";

/// How well the policy addresses the principle.
///
/// Closed set; `Unknown` is the degradation value assigned when a model
/// response carries no recognizable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssessmentCategory {
    AppearsToAddress,
    PartiallyAddresses,
    DoesNotClearlyAddress,
    PotentiallyContradicts,
    Unknown,
}

impl AssessmentCategory {
    /// Canonical label, as used in prompts, context entries, and reports.
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentCategory::AppearsToAddress => "AppearsToAddress",
            AssessmentCategory::PartiallyAddresses => "PartiallyAddresses",
            AssessmentCategory::DoesNotClearlyAddress => "DoesNotClearlyAddress",
            AssessmentCategory::PotentiallyContradicts => "PotentiallyContradicts",
            AssessmentCategory::Unknown => "Unknown",
        }
    }

    /// Parse a label. Exact match (after trimming) against the four defined
    /// categories; anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "AppearsToAddress" => AssessmentCategory::AppearsToAddress,
            "PartiallyAddresses" => AssessmentCategory::PartiallyAddresses,
            "DoesNotClearlyAddress" => AssessmentCategory::DoesNotClearlyAddress,
            "PotentiallyContradicts" => AssessmentCategory::PotentiallyContradicts,
            _ => AssessmentCategory::Unknown,
        }
    }
}

impl fmt::Display for AssessmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The assembled assessment. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Model explanation of the assessed principle.
    pub principle_explanation: String,

    /// Excerpts quoted from the policy, in response order.
    pub policy_snippets: Vec<String>,

    /// Assessment category.
    pub category: AssessmentCategory,

    /// Justification for the category.
    pub justification: String,

    /// The fixed disclaimer, always [`DISCLAIMER`].
    pub disclaimer: &'static str,
}

impl Report {
    /// Render the report as ordered sections of plain text.
    ///
    /// Section order is fixed: principle explanation, quoted policy snippets
    /// (bulleted), assessment category, justification, disclaimer.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("Principle Explanation\n");
        out.push_str("---------------------\n");
        out.push_str(&self.principle_explanation);
        out.push_str("\n\n");

        out.push_str("Policy Snippets\n");
        out.push_str("---------------\n");
        if self.policy_snippets.is_empty() {
            out.push_str("(no relevant excerpts identified)\n");
        } else {
            for snippet in &self.policy_snippets {
                out.push_str("- \"");
                out.push_str(snippet);
                out.push_str("\"\n");
            }
        }
        out.push('\n');

        out.push_str("Assessment\n");
        out.push_str("----------\n");
        out.push_str("Category: ");
        out.push_str(self.category.label());
        out.push('\n');
        out.push_str("Justification: ");
        out.push_str(&self.justification);
        out.push_str("\n\n");

        out.push_str("Disclaimer\n");
        out.push_str("----------\n");
        out.push_str(self.disclaimer);
        out.push('\n');

        out
    }
}

/// Pure fan-in: reads the final context fields and appends the disclaimer.
///
/// The one deterministic, side-effect-free stage of the pipeline. Its only
/// failure mode is a missing context key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler;

impl ReportAssembler {
    /// Stage name reported in pipeline errors.
    pub const NAME: &'static str = "Assemble";

    pub fn new() -> Self {
        Self
    }

    /// Assemble a report from the final context.
    pub fn assemble(&self, context: &Context) -> Result<Report, ContextError> {
        let principle_explanation = context.get_text(keys::PRINCIPLE_EXPLANATION)?.to_string();
        let policy_snippets = context.get_list(keys::POLICY_SNIPPETS)?.to_vec();
        let category = AssessmentCategory::from_label(context.get_text(keys::CATEGORY)?);
        let justification = context.get_text(keys::JUSTIFICATION)?.to_string();

        Ok(Report {
            principle_explanation,
            policy_snippets,
            category,
            justification,
            disclaimer: DISCLAIMER,
        })
    }
}
