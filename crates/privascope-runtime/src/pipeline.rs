//! The standard assessment pipeline, assembled.

use std::sync::Arc;

use tracing::info;

use privascope_core::{Context, Report};

use crate::client::CompletionClient;
use crate::config::{ConfigError, RuntimeConfig};
use crate::fetcher::{HttpPolicyFetcher, PolicyFetcher};
use crate::orchestrator::{Orchestrator, PipelineError};
use crate::providers::GeminiBackend;
use crate::stage::Stage;
use crate::stages::{AssessStage, ExplainStage, ExtractStage, FetchStage};

/// The three caller-supplied inputs of one run.
#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    pub url: String,
    pub regulation: String,
    pub principle: String,
}

/// A ready-to-run pipeline over the fixed stage order
/// Fetch → Explain → Extract → Assess → Assemble.
///
/// The pipeline itself is shared, stateless configuration; each call to
/// [`AssessmentPipeline::assess`] owns its context exclusively, so one
/// pipeline serves any number of concurrent runs.
pub struct AssessmentPipeline {
    orchestrator: Orchestrator,
}

impl std::fmt::Debug for AssessmentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentPipeline").finish_non_exhaustive()
    }
}

impl AssessmentPipeline {
    /// Start building a pipeline with injected collaborators.
    pub fn builder() -> AssessmentPipelineBuilder {
        AssessmentPipelineBuilder::new()
    }

    /// Build the production pipeline: Gemini backend from the environment
    /// credential chain, HTTP fetcher, response cache enabled.
    pub fn standard(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let backend = Arc::new(GeminiBackend::from_env()?);
        let client = Arc::new(CompletionClient::from_runtime_config(backend, config));
        let fetcher = Arc::new(HttpPolicyFetcher::new(config.fetch_timeout)?);

        Self::builder().fetcher(fetcher).client(client).build()
    }

    /// Run one assessment to completion.
    pub async fn assess(&self, request: AssessmentRequest) -> Result<Report, PipelineError> {
        info!(
            url = %request.url,
            regulation = %request.regulation,
            principle = %request.principle,
            "starting assessment"
        );
        let context = Context::initial(request.url, request.regulation, request.principle);
        self.orchestrator.run(context).await
    }
}

/// Builder for [`AssessmentPipeline`].
pub struct AssessmentPipelineBuilder {
    fetcher: Option<Arc<dyn PolicyFetcher>>,
    client: Option<Arc<CompletionClient>>,
}

impl AssessmentPipelineBuilder {
    pub fn new() -> Self {
        Self {
            fetcher: None,
            client: None,
        }
    }

    /// Set the policy fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn PolicyFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the completion client.
    pub fn client(mut self, client: Arc<CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Assemble the fixed stage order.
    pub fn build(self) -> Result<AssessmentPipeline, ConfigError> {
        let fetcher = self
            .fetcher
            .ok_or(ConfigError::MissingComponent("policy fetcher"))?;
        let client = self
            .client
            .ok_or(ConfigError::MissingComponent("completion client"))?;

        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(FetchStage::new(fetcher)),
            Arc::new(ExplainStage::new(client.clone())),
            Arc::new(ExtractStage::new(client.clone())),
            Arc::new(AssessStage::new(client)),
        ];

        Ok(AssessmentPipeline {
            orchestrator: Orchestrator::new(stages),
        })
    }
}

impl Default for AssessmentPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
