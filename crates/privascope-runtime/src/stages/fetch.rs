//! Fetch stage: retrieve the policy page and reduce it to plain text.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use privascope_core::{keys, Context, Value};

use crate::fetcher::{ParseError, PolicyFetcher};
use crate::stage::{Capability, Stage, StageError};

/// Deterministic first stage. Any failure here aborts the run before a
/// single model call is spent.
pub struct FetchStage {
    fetcher: Arc<dyn PolicyFetcher>,
}

impl FetchStage {
    pub const NAME: &'static str = "Fetch";

    pub fn new(fetcher: Arc<dyn PolicyFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Stage for FetchStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[keys::URL]
    }

    fn produces(&self) -> &'static [&'static str] {
        &[keys::POLICY_TEXT]
    }

    fn capability(&self) -> Capability {
        Capability::Deterministic
    }

    async fn run(&self, context: &Context) -> Result<Vec<(String, Value)>, StageError> {
        let url = context.get_text(keys::URL)?;
        let text = self.fetcher.fetch(url).await?;

        if text.trim().is_empty() {
            return Err(ParseError {
                url: url.to_string(),
            }
            .into());
        }

        debug!(url, chars = text.len(), "policy text extracted");
        Ok(vec![(keys::POLICY_TEXT.to_string(), Value::Text(text))])
    }
}
