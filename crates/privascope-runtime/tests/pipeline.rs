//! End-to-end pipeline behavior over stub collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use privascope_core::{keys, AssessmentCategory, Context, Value, DISCLAIMER};
use privascope_runtime::{
    AssessmentPipeline, AssessmentRequest, ChatMessage, CompletionBackend, CompletionClient,
    CompletionConfig, CompletionResponse, FetchError, Orchestrator, PolicyFetcher, ProviderError,
    Stage, StageError, TokenUsage,
};
use privascope_runtime::stages::{AssessStage, ExplainStage, FetchStage};

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Completion backend replaying a scripted response sequence, counting
/// invocations.
struct ScriptedBackend {
    script: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn replying(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
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

/// Fetcher returning fixed text or a fixed error kind.
struct StubFetcher {
    outcome: Result<String, fn(String) -> FetchError>,
}

impl StubFetcher {
    fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(text.to_string()),
        })
    }

    fn failing(make: fn(String) -> FetchError) -> Arc<Self> {
        Arc::new(Self { outcome: Err(make) })
    }
}

#[async_trait]
impl PolicyFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match &self.outcome {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make(url.to_string())),
        }
    }
}

const POLICY_TEXT: &str = "Privacy Policy\nWe collect only data needed to provide the service.";

const EXPLAIN_REPLY: &str = "Data minimization requires collecting only necessary data.";
const EXTRACT_REPLY: &str = "- \"We collect only data needed to provide the service.\"";
const ASSESS_REPLY: &str =
    "Category: PartiallyAddresses\nJustification: The policy mentions minimization but lacks specifics.";

fn request() -> AssessmentRequest {
    AssessmentRequest {
        url: "https://example.com/privacy".to_string(),
        regulation: "GDPR".to_string(),
        principle: "data minimization".to_string(),
    }
}

fn pipeline_over(
    fetcher: Arc<StubFetcher>,
    backend: Arc<ScriptedBackend>,
) -> AssessmentPipeline {
    let client = Arc::new(CompletionClient::new(backend, CompletionConfig::default()));
    AssessmentPipeline::builder()
        .fetcher(fetcher)
        .client(client)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_inputs_produce_byte_identical_reports() {
    let mut renders = Vec::new();
    for _ in 0..2 {
        let pipeline = pipeline_over(
            StubFetcher::returning(POLICY_TEXT),
            ScriptedBackend::replying(&[EXPLAIN_REPLY, EXTRACT_REPLY, ASSESS_REPLY]),
        );
        let report = pipeline.assess(request()).await.unwrap();
        renders.push(report.render());
    }
    assert_eq!(renders[0], renders[1]);
}

#[tokio::test]
async fn missing_extract_fails_assess_validation_without_backend_call() {
    // Assemble a pipeline with the Extract stage left out.
    let backend = ScriptedBackend::replying(&[EXPLAIN_REPLY, ASSESS_REPLY]);
    let client = Arc::new(CompletionClient::new(
        backend.clone(),
        CompletionConfig::default(),
    ));
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(FetchStage::new(StubFetcher::returning(POLICY_TEXT))),
        Arc::new(ExplainStage::new(client.clone())),
        Arc::new(AssessStage::new(client)),
    ];
    let orchestrator = Orchestrator::new(stages);

    let err = orchestrator
        .run(Context::initial(
            "https://example.com/privacy",
            "GDPR",
            "data minimization",
        ))
        .await
        .unwrap_err();

    assert_eq!(err.stage, "Assess");
    assert!(matches!(
        err.cause,
        StageError::MissingInput { ref key } if key == keys::POLICY_SNIPPETS
    ));
    // Only the Explain call was made; Assess never reached the backend.
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn fetch_failure_aborts_before_any_completion_call() {
    let backend = ScriptedBackend::replying(&[EXPLAIN_REPLY, EXTRACT_REPLY, ASSESS_REPLY]);
    let pipeline = pipeline_over(
        StubFetcher::failing(|url| FetchError::HttpStatus { url, status: 503 }),
        backend.clone(),
    );

    let err = pipeline.assess(request()).await.unwrap_err();
    assert_eq!(err.stage, "Fetch");
    assert!(matches!(err.cause, StageError::Fetch(_)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn malformed_assessment_degrades_to_unknown_report() {
    let pipeline = pipeline_over(
        StubFetcher::returning(POLICY_TEXT),
        ScriptedBackend::replying(&[
            EXPLAIN_REPLY,
            EXTRACT_REPLY,
            "Honestly this policy looks pretty reasonable to me.",
        ]),
    );

    let report = pipeline.assess(request()).await.unwrap();
    assert_eq!(report.category, AssessmentCategory::Unknown);
    assert!(report.render().contains("Category: Unknown"));
}

#[tokio::test]
async fn rendered_report_carries_all_fields_verbatim_and_disclaimer_last() {
    let pipeline = pipeline_over(
        StubFetcher::returning(POLICY_TEXT),
        ScriptedBackend::replying(&[EXPLAIN_REPLY, EXTRACT_REPLY, ASSESS_REPLY]),
    );

    let report = pipeline.assess(request()).await.unwrap();
    let rendered = report.render();

    assert!(rendered.contains("Data minimization requires collecting only necessary data."));
    assert!(rendered.contains("We collect only data needed to provide the service."));
    assert!(rendered.contains("PartiallyAddresses"));
    assert!(rendered.contains("The policy mentions minimization but lacks specifics."));
    assert!(rendered.trim_end().ends_with(DISCLAIMER));
}

#[tokio::test]
async fn producing_an_existing_key_aborts_with_collision() {
    /// A stage that claims to produce `policyText` again.
    struct OverwritingStage;

    #[async_trait]
    impl Stage for OverwritingStage {
        fn name(&self) -> &'static str {
            "Overwrite"
        }
        fn requires(&self) -> &'static [&'static str] {
            &[]
        }
        fn produces(&self) -> &'static [&'static str] {
            &[keys::POLICY_TEXT]
        }
        fn capability(&self) -> privascope_runtime::Capability {
            privascope_runtime::Capability::Deterministic
        }
        async fn run(&self, _: &Context) -> Result<Vec<(String, Value)>, StageError> {
            Ok(vec![(
                keys::POLICY_TEXT.to_string(),
                Value::from("overwritten"),
            )])
        }
    }

    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(FetchStage::new(StubFetcher::returning(POLICY_TEXT))),
        Arc::new(OverwritingStage),
    ];
    let orchestrator = Orchestrator::new(stages);

    let err = orchestrator
        .run(Context::initial("u", "r", "p"))
        .await
        .unwrap_err();
    assert_eq!(err.stage, "Overwrite");
    assert!(matches!(
        err.cause,
        StageError::KeyCollision { ref key } if key == keys::POLICY_TEXT
    ));
}

#[tokio::test]
async fn empty_extraction_still_produces_a_report() {
    let pipeline = pipeline_over(
        StubFetcher::returning(POLICY_TEXT),
        ScriptedBackend::replying(&[
            EXPLAIN_REPLY,
            "No relevant excerpts.",
            "Category: DoesNotClearlyAddress\nJustification: Nothing in the policy speaks to this principle.",
        ]),
    );

    let report = pipeline.assess(request()).await.unwrap();
    assert_eq!(report.category, AssessmentCategory::DoesNotClearlyAddress);
    assert!(report.policy_snippets.is_empty());
    assert!(report.render().contains("(no relevant excerpts identified)"));
}
