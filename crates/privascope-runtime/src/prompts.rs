//! Prompt templates for the generative stages.
//!
//! Substitution fields use `{name}` placeholders rendered by the completion
//! client. Each prompt pins the response format the deterministic parsers
//! in `privascope-core` expect; drift from that format degrades (it never
//! crashes a stage), but the closer the backend sticks to it, the less
//! information the report loses.

use crate::client::PromptTemplate;

/// System instruction for the Explain stage.
pub const EXPLAIN_SYSTEM: &str = r#"You are an expert in privacy regulations and data protection. Your task is to clearly and concisely explain a given privacy principle or regulation: its core meaning, why it matters, and a simple example. Respond with the explanation text only, no headings and no preamble."#;

/// User body for the Explain stage.
pub const EXPLAIN_USER: &str = r#"Explain the privacy principle '{principle}' as it appears in the regulation '{regulation}'. Focus on its core meaning and importance, and give one simple example."#;

/// The Explain template.
pub const EXPLAIN: PromptTemplate = PromptTemplate {
    name: "Explain",
    system: EXPLAIN_SYSTEM,
    user: EXPLAIN_USER,
};

/// System instruction for the Extract stage.
pub const EXTRACT_SYSTEM: &str = r#"You are an assistant specialized in privacy policy analysis. Your task is to find the clauses of a privacy policy that are relevant to a given privacy principle and quote them exactly.

Respond with one excerpt per line, each line starting with '- '. Quote the policy text verbatim; do not paraphrase. List at most five excerpts, most relevant first. If the policy does not address the principle, respond with the single line:
No relevant excerpts."#;

/// User body for the Extract stage.
pub const EXTRACT_USER: &str = r#"Find the passages of the following privacy policy that are relevant to the principle '{principle}'.

PRIVACY POLICY TEXT:
{policy_text}"#;

/// The Extract template.
pub const EXTRACT: PromptTemplate = PromptTemplate {
    name: "Extract",
    system: EXTRACT_SYSTEM,
    user: EXTRACT_USER,
};

/// System instruction for the Assess stage.
pub const ASSESS_SYSTEM: &str = r#"You are an assistant specialized in privacy compliance assessment. You will be given an explanation of a privacy principle and excerpts quoted from a privacy policy. Assess how well the policy addresses the principle, based only on the provided material.

Respond in exactly this format, nothing else:
Category: <one of AppearsToAddress, PartiallyAddresses, DoesNotClearlyAddress, PotentiallyContradicts>
Justification: <one or two sentences referencing the explanation and the excerpts>"#;

/// User body for the Assess stage.
pub const ASSESS_USER: &str = r#"Principle: {principle}

Explanation of the principle:
{principle_explanation}

Excerpts quoted from the policy:
{policy_snippets}

Assess how well the policy addresses the principle."#;

/// The Assess template.
pub const ASSESS: PromptTemplate = PromptTemplate {
    name: "Assess",
    system: ASSESS_SYSTEM,
    user: ASSESS_USER,
};
