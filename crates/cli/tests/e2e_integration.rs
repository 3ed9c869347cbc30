//! End-to-end tests: configuration → context store → fallback chain →
//! commentary text and usage report, with scripted providers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glossa_commentary::{AnalysisKind, CommentaryService, DISABLED_NOTICE, FALLBACK_NOTICE};
use glossa_config::{AppConfig, CandidateConfig};
use glossa_context::{ContextRelevanceSelector, ContextStore, LoadOptions};
use glossa_core::error::ProviderError;
use glossa_core::provider::{Completion, CompletionRequest, Provider};
use glossa_core::{ChainState, FailureKind, ProviderFamily, ServiceCandidate};
use glossa_providers::{FallbackChain, build_chain_with};
use glossa_telemetry::OutcomeTracker;

// ── Mock Provider ────────────────────────────────────────────────────────

enum Step {
    Reply(&'static str),
    Fail(ProviderError),
    Hang,
}

/// Plays back scripted steps and remembers every prompt it received.
struct ScriptedProvider {
    name: String,
    steps: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(name: &str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            steps: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(Completion::text(text, &self.name)),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Completion::text("too late", &self.name))
            }
            None => Err(ProviderError::InvalidResponse("script exhausted".into())),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const GLOSSARY: &str = "# Validation glossary\n\n\
## Recall\n\
Recall measures the share of true personal data fields that the recognition \
method actually flagged during validation of the dataset.\n\n\
## Precision\n\
Precision measures the share of flagged fields that were confirmed as personal \
data by the validators, so false positives lower it.\n";

const SYSTEM: &str = "SYSTEM OVERVIEW\n\
The anonymisation pipeline scans every column of the dataset and records the \
method, the confidence and the validation outcome for each field.\n";

fn context_store() -> (tempfile::TempDir, Arc<ContextStore>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("01_glossary.md"), GLOSSARY).unwrap();
    std::fs::write(dir.path().join("02_system.txt"), SYSTEM).unwrap();
    let options = LoadOptions {
        min_section_chars: 40,
        mandatory: true,
    };
    let store = ContextStore::load(dir.path(), &options).unwrap();
    (dir, Arc::new(store))
}

fn service_with(
    links: Vec<(&str, Arc<ScriptedProvider>)>,
    store: Arc<ContextStore>,
) -> CommentaryService {
    let tracker = Arc::new(OutcomeTracker::new());
    let mut builder = FallbackChain::builder(tracker).attempt_timeout(Duration::from_secs(60));
    for (priority, (id, provider)) in links.into_iter().enumerate() {
        builder = builder.candidate(
            ServiceCandidate::new(id, ProviderFamily::Custom, priority as u32),
            provider as Arc<dyn Provider>,
        );
    }
    CommentaryService::new(
        Arc::new(builder.build().unwrap()),
        ContextRelevanceSelector::new(store),
        4000,
    )
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn timeout_then_quota_then_success() {
    let (_dir, store) = context_store();
    let primary = ScriptedProvider::new("primary", vec![Step::Hang]);
    let secondary = ScriptedProvider::new(
        "secondary",
        vec![Step::Fail(ProviderError::QuotaExceeded("insufficient_quota".into()))],
    );
    let tertiary = ScriptedProvider::new("tertiary", vec![Step::Reply("Recall is high.")]);
    let service = service_with(
        vec![
            ("primary", Arc::clone(&primary)),
            ("secondary", Arc::clone(&secondary)),
            ("tertiary", Arc::clone(&tertiary)),
        ],
        store,
    );

    let (text, result) = service
        .generate_commentary("Comment on recall by method", &["recall"], 4000)
        .await;

    assert_eq!(text, "Recall is high.");
    assert_eq!(result.state, ChainState::Succeeded);
    assert_eq!(result.succeeded_candidate.as_deref(), Some("tertiary"));
    let kinds: Vec<Option<FailureKind>> = result.attempts.iter().map(|a| a.error).collect();
    assert_eq!(
        kinds,
        vec![Some(FailureKind::Timeout), Some(FailureKind::QuotaExceeded), None]
    );

    // Every candidate saw the same prompt, including the recall section.
    let prompt = &tertiary.prompts()[0];
    assert_eq!(&primary.prompts()[0], prompt);
    assert!(prompt.starts_with("Comment on recall by method"));
    assert!(prompt.contains("## Recall"));
    assert!(!prompt.contains("## Precision"));

    let summary = service.tracker().summary();
    assert_eq!(summary.total_attempts, 3);
    assert_eq!(summary.primary_candidate(), Some("tertiary"));
}

#[tokio::test]
async fn exhausted_chain_returns_fallback_notice() {
    let (_dir, store) = context_store();
    let only = ScriptedProvider::new(
        "only",
        vec![
            Step::Fail(ProviderError::Network("connection reset".into())),
        ],
    );
    let service = service_with(vec![("only", only)], store);

    let (text, result) = service.generate_commentary("Topic", &["precision"], 4000).await;

    assert_eq!(text, FALLBACK_NOTICE);
    assert_eq!(result.state, ChainState::Exhausted);
    assert!(result.text.is_none());
    assert_eq!(result.attempts.len(), 1);
    assert_eq!(result.attempts[0].error, Some(FailureKind::NetworkError));
}

#[tokio::test]
async fn analysis_kind_pulls_kind_specific_context() {
    let (_dir, store) = context_store();
    let writer = ScriptedProvider::new("writer", vec![Step::Reply("Chart text.")]);
    let service = service_with(vec![("writer", Arc::clone(&writer))], store);

    let (text, _) = service
        .commentary_for(AnalysisKind::ChartCommentary, None, "Precision per method")
        .await;

    assert_eq!(text, "Chart text.");
    let prompt = &writer.prompts()[0];
    assert!(prompt.contains("## Precision"));
    assert!(prompt.contains("## Recall"));
    assert!(prompt.contains(AnalysisKind::ChartCommentary.instructions()));
}

#[tokio::test]
async fn concurrent_batch_is_fully_tracked() {
    let (_dir, store) = context_store();
    let replies: Vec<Step> = (0..8).map(|_| Step::Reply("ok")).collect();
    let provider = ScriptedProvider::new("batch", replies);
    let service = Arc::new(service_with(vec![("batch", provider)], store));

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .generate_commentary(&format!("Topic {i}"), &["recall"], 500)
                .await
        }));
    }
    for handle in handles {
        let (text, result) = handle.await.unwrap();
        assert_eq!(text, "ok");
        assert!(result.is_success());
    }

    let served = service.tracker().served_by();
    assert_eq!(served.len(), 8);
    assert!(served.iter().all(|s| s.candidate.as_deref() == Some("batch")));
    assert!(service.tracker().summary().to_markdown().contains("batch"));
}

#[tokio::test]
async fn config_without_keys_exhausts_with_auth_report() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[commentary]
attempt_timeout_secs = 5

[[candidates]]
id = "first"
family = "openai"
api_key_env = "GLOSSA_E2E_UNSET_KEY_A"

[[candidates]]
id = "second"
family = "gemini"
api_key_env = "GLOSSA_E2E_UNSET_KEY_B"
"#,
    )
    .unwrap();
    let config = AppConfig::load_from(&config_path).unwrap();

    let tracker = Arc::new(OutcomeTracker::new());
    let chain = build_chain_with(&config, Arc::clone(&tracker), |_| None).unwrap();
    let service = CommentaryService::new(
        Arc::new(chain),
        ContextRelevanceSelector::new(Arc::new(ContextStore::empty())),
        config.commentary.context_budget_chars,
    );

    let (text, result) = service.generate_commentary::<&str>("Topic", &[], 0).await;

    assert_eq!(text, FALLBACK_NOTICE);
    assert_eq!(result.state, ChainState::Exhausted);
    assert_eq!(result.authentication_failures(), vec!["first", "second"]);
    let report = result.failure_report();
    assert!(report.contains("GLOSSA_E2E_UNSET_KEY_A"));
    assert!(report.contains("GLOSSA_E2E_UNSET_KEY_B"));
    assert_eq!(tracker.len(), 2);
}

#[tokio::test]
async fn disabled_config_never_touches_context_or_providers() {
    let mut config = AppConfig::default();
    config.commentary.enabled = false;
    config.context.dir = "/nonexistent/glossa-context".into();
    config.context.mandatory = true;
    config.candidates = vec![CandidateConfig::new("unused", "openai")];

    let tracker = Arc::new(OutcomeTracker::new());
    let service = CommentaryService::from_config(&config, Arc::clone(&tracker)).unwrap();

    let (text, result) = service.generate_commentary("Topic", &["recall"], 4000).await;

    assert!(!service.is_enabled());
    assert_eq!(text, DISABLED_NOTICE);
    assert_eq!(result.state, ChainState::Disabled);
    assert!(tracker.is_empty());
}

#[test]
fn mandatory_context_missing_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = LoadOptions {
        min_section_chars: 40,
        mandatory: true,
    };
    assert!(ContextStore::load(dir.path().join("missing"), &options).is_err());
}
