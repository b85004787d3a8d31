//! Extract stage: pull principle-relevant excerpts out of the policy text.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use privascope_core::{keys, response, Context, Value};

use crate::client::CompletionClient;
use crate::prompts;
use crate::stage::{Capability, Stage, StageError};

/// Second generative stage. An empty excerpt list is a valid outcome (the
/// policy may simply not address the principle); the Assess stage still
/// runs and judges on that basis.
pub struct ExtractStage {
    client: Arc<CompletionClient>,
}

impl ExtractStage {
    pub const NAME: &'static str = "Extract";

    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for ExtractStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[keys::POLICY_TEXT, keys::PRINCIPLE]
    }

    fn produces(&self) -> &'static [&'static str] {
        &[keys::POLICY_SNIPPETS]
    }

    fn capability(&self) -> Capability {
        Capability::Generative
    }

    async fn run(&self, context: &Context) -> Result<Vec<(String, Value)>, StageError> {
        let policy_text = context.get_text(keys::POLICY_TEXT)?;
        let principle = context.get_text(keys::PRINCIPLE)?;

        let raw = self
            .client
            .complete(
                &prompts::EXTRACT,
                &[("policy_text", policy_text), ("principle", principle)],
            )
            .await
            .map_err(StageError::from)?;

        let snippets = response::parse_snippets(&raw);
        debug!(count = snippets.len(), "policy excerpts extracted");
        Ok(vec![(
            keys::POLICY_SNIPPETS.to_string(),
            Value::List(snippets),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{scripted_client, ScriptedBackend};

    fn context_with_policy() -> Context {
        let mut context = Context::initial("u", "GDPR", "data minimization");
        context
            .put(keys::POLICY_TEXT, Value::from("We collect only what we need."))
            .unwrap();
        context
    }

    #[tokio::test]
    async fn test_extract_collects_bulleted_excerpts() {
        let backend = ScriptedBackend::replying(&[
            "- \"We collect only data needed to provide the service.\"\n- \"Data is deleted on request.\"",
        ]);
        let stage = ExtractStage::new(scripted_client(backend));
        let outputs = stage.run(&context_with_policy()).await.unwrap();

        assert_eq!(
            outputs,
            vec![(
                keys::POLICY_SNIPPETS.to_string(),
                Value::List(vec![
                    "We collect only data needed to provide the service.".to_string(),
                    "Data is deleted on request.".to_string(),
                ]),
            )]
        );
    }

    #[tokio::test]
    async fn test_extract_with_no_excerpts_produces_empty_list() {
        let backend = ScriptedBackend::replying(&["No relevant excerpts."]);
        let stage = ExtractStage::new(scripted_client(backend));
        let outputs = stage.run(&context_with_policy()).await.unwrap();

        assert_eq!(
            outputs,
            vec![(keys::POLICY_SNIPPETS.to_string(), Value::List(vec![]))]
        );
    }
}
