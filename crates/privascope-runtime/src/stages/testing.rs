//! Shared test doubles for stage tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::CompletionClient;
use crate::providers::{
    ChatMessage, CompletionBackend, CompletionConfig, CompletionResponse, ProviderError,
    TokenUsage,
};

/// Backend replaying a scripted sequence of responses, counting calls.
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn replying(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
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
        let content = self
            .script
            .lock()
            .pop_front()
            .ok_or_else(|| ProviderError::NotConfigured("script exhausted".to_string()))?;
        Ok(CompletionResponse {
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

/// Wrap a scripted backend in a cache-less client.
pub(crate) fn scripted_client(backend: Arc<ScriptedBackend>) -> Arc<CompletionClient> {
    Arc::new(CompletionClient::new(backend, CompletionConfig::default()))
}
