//! Deterministic parsers for generative stage responses.
//!
//! Backend output format is not under this system's control, so every
//! extractor here is total: off-format input degrades (empty snippet list,
//! `Unknown` category, raw text kept as justification) instead of failing
//! the stage. Degradation stays visible in the final report.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::report::AssessmentCategory;

/// Maximum number of excerpt snippets kept from an extraction response.
pub const MAX_SNIPPETS: usize = 5;

lazy_static! {
    static ref BULLET_LINE: Regex =
        Regex::new(r"^\s*(?:[-*\u{2022}]|\d+[.)])\s+(?P<body>.+)$").expect("bullet regex");
    static ref CATEGORY_LINE: Regex =
        Regex::new(r"(?im)^\s*\**\s*category\s*\**\s*:\s*\**\s*(?P<label>.+)$")
            .expect("category regex");
    static ref JUSTIFICATION_LINE: Regex =
        Regex::new(r"(?im)^\s*\**\s*justification\s*\**\s*:\s*\**\s*(?P<body>.+)$")
            .expect("justification regex");
    static ref EXPLANATION_PREFIX: Regex =
        Regex::new(r"(?i)^\s*explanation\s*:\s*").expect("explanation regex");
}

/// Reduce an explanation response to plain explanation text.
///
/// Strips an optional `Explanation:` lead-in some models insist on.
pub fn parse_explanation(raw: &str) -> String {
    EXPLANATION_PREFIX.replace(raw.trim(), "").trim().to_string()
}

/// Pull quoted policy excerpts out of an extraction response.
///
/// Keeps bullet lines (`-`, `*`, `•`, or numbered), stripped of bullet
/// markers, surrounding brackets, and quote characters, capped at
/// [`MAX_SNIPPETS`] in response order. A response with no bullet lines
/// yields an empty list.
pub fn parse_snippets(raw: &str) -> Vec<String> {
    let mut snippets = Vec::new();
    let mut dropped = 0usize;

    for line in raw.lines() {
        let Some(caps) = BULLET_LINE.captures(line) else {
            continue;
        };
        let cleaned = clean_snippet(&caps["body"]);
        if cleaned.is_empty() {
            continue;
        }
        if snippets.len() < MAX_SNIPPETS {
            snippets.push(cleaned);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = snippets.len(), "excerpt list truncated");
    }
    snippets
}

/// Pull the category label and justification out of an assessment response.
///
/// The label must match one of the four defined categories exactly;
/// anything else degrades to [`AssessmentCategory::Unknown`]. When no
/// `Justification:` line is present the whole trimmed response is kept, so
/// a degraded report still shows what the model said.
pub fn parse_assessment(raw: &str) -> (AssessmentCategory, String) {
    let category = CATEGORY_LINE
        .captures(raw)
        .map(|caps| AssessmentCategory::from_label(clean_label(&caps["label"])))
        .unwrap_or(AssessmentCategory::Unknown);

    let justification = JUSTIFICATION_LINE
        .captures(raw)
        .map(|caps| caps["body"].trim().to_string())
        .unwrap_or_else(|| raw.trim().to_string());

    (category, justification)
}

/// Strip markdown emphasis and a trailing period from a captured label.
fn clean_label(label: &str) -> &str {
    label
        .trim()
        .trim_matches(|c| c == '*' || c == '`')
        .trim_end_matches('.')
        .trim()
}

/// Strip bullet decoration from an excerpt body.
fn clean_snippet(body: &str) -> String {
    let mut s = body.trim();
    // The extract prompt formats excerpts as "[...]" or quoted text.
    if s.starts_with('[') && s.ends_with(']') && s.len() >= 2 {
        s = s[1..s.len() - 1].trim();
    }
    s.trim_matches(|c| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
        .to_string()
}
