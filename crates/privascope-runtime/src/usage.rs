//! Per-template call and token accounting.
//!
//! One tracker lives on each completion client and is shared by every run
//! using that client. Counters only ever increase; readers get snapshots.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::providers::TokenUsage;

/// Counters for one prompt template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateUsage {
    /// Completed backend calls.
    pub calls: u32,

    /// Retries spent (at most one per call).
    pub retries: u32,

    /// Prompt tokens reported by the backend.
    pub prompt_tokens: u32,

    /// Completion tokens reported by the backend.
    pub completion_tokens: u32,
}

/// Thread-safe usage tracker shared by one completion client.
#[derive(Debug, Default)]
pub struct UsageTracker {
    calls: AtomicU32,
    retries: AtomicU32,
    by_template: RwLock<HashMap<&'static str, TemplateUsage>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed backend call.
    pub fn record_call(&self, template: &'static str, usage: &TokenUsage) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut by_template = self.by_template.write();
        let entry = by_template.entry(template).or_default();
        entry.calls += 1;
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
    }

    /// Record a retry attempt for a template.
    pub fn record_retry(&self, template: &'static str) {
        self.retries.fetch_add(1, Ordering::SeqCst);
        self.by_template.write().entry(template).or_default().retries += 1;
    }

    /// Total completed backend calls across all templates.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total retries spent across all templates.
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Snapshot of per-template counters.
    pub fn snapshot(&self) -> HashMap<&'static str, TemplateUsage> {
        self.by_template.read().clone()
    }

    /// Total tokens across all templates.
    pub fn total_tokens(&self) -> u32 {
        self.by_template
            .read()
            .values()
            .map(|u| u.prompt_tokens + u.completion_tokens)
            .sum()
    }
}
