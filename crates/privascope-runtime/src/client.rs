//! Text-completion client: deterministic template rendering, the one
//! permitted retry, and the shared response cache.
//!
//! The client holds no per-run state. One instance, wrapped in an `Arc`,
//! serves every concurrent pipeline run.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CompletionCache};
use crate::config::RuntimeConfig;
use crate::providers::{
    ChatMessage, CompletionBackend, CompletionConfig, ProviderError,
};
use crate::usage::UsageTracker;

/// A named prompt template: a system instruction plus a user body with
/// `{placeholder}` substitution fields.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    /// Template name, used in errors, usage accounting, and cache keys.
    pub name: &'static str,

    /// System instruction. No substitution fields.
    pub system: &'static str,

    /// User body with named placeholders.
    pub user: &'static str,
}

/// A required placeholder had no substitution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template '{template}' has no substitution for placeholder '{placeholder}'")]
pub struct TemplateError {
    pub template: &'static str,
    pub placeholder: String,
}

/// The backend failed after the one permitted retry (or immediately, for
/// non-transient failures).
#[derive(Error, Debug)]
#[error("completion backend '{backend}' failed: {cause}")]
pub struct ModelError {
    pub backend: String,
    #[source]
    pub cause: ProviderError,
}

/// Errors from the completion client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex"))
}

/// Render a template body, substituting every named placeholder.
///
/// Rendering is deterministic and validates the template before touching
/// substitution values, so a value containing brace syntax can never be
/// re-interpreted as a placeholder.
pub(crate) fn render(
    template: &PromptTemplate,
    substitutions: &[(&str, &str)],
) -> Result<String, TemplateError> {
    let body = template.user;
    let lookup = |name: &str| {
        substitutions
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    };

    for caps in placeholder_regex().captures_iter(body) {
        let name = &caps[1];
        if lookup(name).is_none() {
            return Err(TemplateError {
                template: template.name,
                placeholder: name.to_string(),
            });
        }
    }

    let rendered = placeholder_regex().replace_all(body, |caps: &regex::Captures<'_>| {
        lookup(&caps[1]).expect("placeholders validated above").to_string()
    });
    Ok(rendered.into_owned())
}

/// The shared text-completion client.
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    config: CompletionConfig,
    retry_delay: Duration,
    cache: Option<CompletionCache>,
    usage: UsageTracker,
}

impl CompletionClient {
    /// Create a client with explicit completion configuration and no cache.
    pub fn new(backend: Arc<dyn CompletionBackend>, config: CompletionConfig) -> Self {
        Self {
            backend,
            config,
            retry_delay: Duration::from_millis(250),
            cache: None,
            usage: UsageTracker::new(),
        }
    }

    /// Create a client from the runtime configuration, cache enabled.
    pub fn from_runtime_config(backend: Arc<dyn CompletionBackend>, config: &RuntimeConfig) -> Self {
        Self {
            backend,
            config: config.completion_config(),
            retry_delay: config.retry_delay,
            cache: Some(CompletionCache::with_defaults()),
            usage: UsageTracker::new(),
        }
    }

    /// Attach a response cache.
    pub fn with_cache(mut self, cache: CompletionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the fixed retry backoff.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Call and token accounting for this client.
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Render `template` with `substitutions` and run it through the
    /// backend.
    ///
    /// Transient failures get exactly one retry after a fixed backoff;
    /// non-transient failures propagate immediately. Either way a failed
    /// call surfaces as [`ModelError`].
    pub async fn complete(
        &self,
        template: &PromptTemplate,
        substitutions: &[(&str, &str)],
    ) -> Result<String, ClientError> {
        let user = render(template, substitutions)?;

        let cache_key = CacheKey::new(template.name, &user, &self.config.model);
        if let Some(cache) = &self.cache {
            if let Some(content) = cache.get(&cache_key).await {
                debug!(template = template.name, "completion served from cache");
                return Ok(content);
            }
        }

        let messages = vec![
            ChatMessage::system(template.system),
            ChatMessage::user(user),
        ];

        let backoff = ConstantBuilder::default()
            .with_delay(self.retry_delay)
            .with_max_times(1);

        let response = (|| {
            let messages = messages.clone();
            async move { self.backend.complete(messages, &self.config).await }
        })
        .retry(backoff)
        .when(|err: &ProviderError| err.is_transient())
        .notify(|err: &ProviderError, delay: Duration| {
            warn!(
                template = template.name,
                error = %err,
                ?delay,
                "transient backend failure, retrying once"
            );
            self.usage.record_retry(template.name);
        })
        .await
        .map_err(|cause| ModelError {
            backend: self.backend.name().to_string(),
            cause,
        })?;

        self.usage.record_call(template.name, &response.usage);
        debug!(
            template = template.name,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "completion finished"
        );

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, response.content.clone()).await;
        }

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::providers::{CompletionResponse, TokenUsage};

    const TEMPLATE: PromptTemplate = PromptTemplate {
        name: "Test",
        system: "You are a test fixture.",
        user: "Explain {principle} under {regulation}.",
    };

    /// Backend replaying a scripted sequence of results.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .pop_front()
                .unwrap_or(Err(ProviderError::NotConfigured("script exhausted".into())));
            next.map(|content| CompletionResponse {
                content,
                usage: TokenUsage::default(),
                model: "scripted".to_string(),
                finish_reason: Some("STOP".to_string()),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn client(backend: Arc<ScriptedBackend>) -> CompletionClient {
        CompletionClient::new(backend, CompletionConfig::default())
            .with_retry_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_render_substitutes_named_fields() {
        let rendered = render(
            &TEMPLATE,
            &[("principle", "data minimization"), ("regulation", "GDPR")],
        )
        .unwrap();
        assert_eq!(rendered, "Explain data minimization under GDPR.");
    }

    #[test]
    fn test_render_missing_placeholder_fails() {
        let err = render(&TEMPLATE, &[("principle", "x")]).unwrap_err();
        assert_eq!(err.placeholder, "regulation");
        assert_eq!(err.template, "Test");
    }

    #[test]
    fn test_render_does_not_reinterpret_values() {
        let rendered = render(
            &TEMPLATE,
            &[("principle", "{regulation}"), ("regulation", "GDPR")],
        )
        .unwrap();
        assert_eq!(rendered, "Explain {regulation} under GDPR.");
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let backend = ScriptedBackend::new(vec![
            Err(ProviderError::Timeout(Duration::from_secs(15))),
            Ok("recovered".to_string()),
        ]);
        let client = client(backend.clone());

        let content = client
            .complete(&TEMPLATE, &[("principle", "p"), ("regulation", "r")])
            .await
            .unwrap();
        assert_eq!(content, "recovered");
        assert_eq!(backend.calls(), 2);
        assert_eq!(client.usage().retries(), 1);
        assert_eq!(client.usage().calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_not_retried_twice() {
        let backend = ScriptedBackend::new(vec![
            Err(ProviderError::Timeout(Duration::from_secs(15))),
            Err(ProviderError::Timeout(Duration::from_secs(15))),
            Ok("never reached".to_string()),
        ]);
        let client = client(backend.clone());

        let err = client
            .complete(&TEMPLATE, &[("principle", "p"), ("regulation", "r")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Model(ModelError {
                cause: ProviderError::Timeout(_),
                ..
            })
        ));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_transient_failure_propagates_immediately() {
        let backend = ScriptedBackend::new(vec![
            Err(ProviderError::Auth),
            Ok("never reached".to_string()),
        ]);
        let client = client(backend.clone());

        let err = client
            .complete(&TEMPLATE, &[("principle", "p"), ("regulation", "r")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Model(ModelError {
                cause: ProviderError::Auth,
                ..
            })
        ));
        assert_eq!(backend.calls(), 1);
        assert_eq!(client.usage().retries(), 0);
    }

    #[tokio::test]
    async fn test_cache_spares_repeat_calls() {
        let backend = ScriptedBackend::new(vec![Ok("cached answer".to_string())]);
        let client = client(backend.clone()).with_cache(CompletionCache::with_defaults());
        let subs = [("principle", "p"), ("regulation", "r")];

        let first = client.complete(&TEMPLATE, &subs).await.unwrap();
        let second = client.complete(&TEMPLATE, &subs).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
    }
}
