//! Completion response cache.
//!
//! Zero-temperature completions are stable enough to reuse; caching spares
//! repeat assessments of the same policy a backend round-trip. The cache is
//! shared and thread-safe, keyed on hashes of the rendered prompt, and is
//! never part of per-run state.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use moka::future::Cache;

/// Cache key for completion responses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    template: &'static str,
    prompt_hash: u64,
    model_hash: u64,
}

impl CacheKey {
    /// Build a key from the template name, the fully rendered prompt, and
    /// the model name.
    pub fn new(template: &'static str, rendered_prompt: &str, model: &str) -> Self {
        Self {
            template,
            prompt_hash: hash_str(rendered_prompt),
            model_hash: hash_str(model),
        }
    }
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Shared completion cache backed by moka.
pub struct CompletionCache {
    cache: Cache<CacheKey, String>,
}

impl CompletionCache {
    /// Create a cache with explicit capacity and time-to-live.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Default sizing: 1024 entries, 15 minute time-to-live.
    pub fn with_defaults() -> Self {
        Self::new(1024, Duration::from_secs(15 * 60))
    }

    /// Look up a cached response.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        self.cache.get(key).await
    }

    /// Store a response.
    pub async fn insert(&self, key: CacheKey, content: String) {
        self.cache.insert(key, content).await;
    }
}
