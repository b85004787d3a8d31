//! Explain stage: have the backend explain the assessed principle.

use std::sync::Arc;

use async_trait::async_trait;

use privascope_core::{keys, response, Context, Value};

use crate::client::CompletionClient;
use crate::prompts;
use crate::stage::{Capability, Stage, StageError};

/// First generative stage. Its output feeds the Assess stage verbatim.
pub struct ExplainStage {
    client: Arc<CompletionClient>,
}

impl ExplainStage {
    pub const NAME: &'static str = "Explain";

    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for ExplainStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[keys::REGULATION, keys::PRINCIPLE]
    }

    fn produces(&self) -> &'static [&'static str] {
        &[keys::PRINCIPLE_EXPLANATION]
    }

    fn capability(&self) -> Capability {
        Capability::Generative
    }

    async fn run(&self, context: &Context) -> Result<Vec<(String, Value)>, StageError> {
        let regulation = context.get_text(keys::REGULATION)?;
        let principle = context.get_text(keys::PRINCIPLE)?;

        let raw = self
            .client
            .complete(
                &prompts::EXPLAIN,
                &[("regulation", regulation), ("principle", principle)],
            )
            .await
            .map_err(StageError::from)?;

        let explanation = response::parse_explanation(&raw);
        Ok(vec![(
            keys::PRINCIPLE_EXPLANATION.to_string(),
            Value::Text(explanation),
        )])
    }
}
