//! Assess stage: judge how well the policy addresses the principle.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use privascope_core::{keys, response, AssessmentCategory, Context, Value};

use crate::client::CompletionClient;
use crate::prompts;
use crate::stage::{Capability, Stage, StageError};

/// Final generative stage. An unrecognizable category label degrades to
/// `Unknown` instead of failing the run; the degradation stays visible in
/// the assembled report.
pub struct AssessStage {
    client: Arc<CompletionClient>,
}

impl AssessStage {
    pub const NAME: &'static str = "Assess";

    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for AssessStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[
            keys::PRINCIPLE,
            keys::PRINCIPLE_EXPLANATION,
            keys::POLICY_SNIPPETS,
        ]
    }

    fn produces(&self) -> &'static [&'static str] {
        &[keys::CATEGORY, keys::JUSTIFICATION]
    }

    fn capability(&self) -> Capability {
        Capability::Generative
    }

    async fn run(&self, context: &Context) -> Result<Vec<(String, Value)>, StageError> {
        let principle = context.get_text(keys::PRINCIPLE)?;
        let explanation = context.get_text(keys::PRINCIPLE_EXPLANATION)?;
        let snippets = context.get_list(keys::POLICY_SNIPPETS)?;

        let snippets_block = if snippets.is_empty() {
            "(no relevant excerpts were found)".to_string()
        } else {
            snippets
                .iter()
                .map(|snippet| format!("- \"{snippet}\""))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let raw = self
            .client
            .complete(
                &prompts::ASSESS,
                &[
                    ("principle", principle),
                    ("principle_explanation", explanation),
                    ("policy_snippets", &snippets_block),
                ],
            )
            .await
            .map_err(StageError::from)?;

        let (category, justification) = response::parse_assessment(&raw);
        if category == AssessmentCategory::Unknown {
            warn!("category label not recognized; degrading to Unknown");
        }

        Ok(vec![
            (
                keys::CATEGORY.to_string(),
                Value::Text(category.label().to_string()),
            ),
            (keys::JUSTIFICATION.to_string(), Value::Text(justification)),
        ])
    }
}
