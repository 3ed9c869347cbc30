//! CommentaryService — the top-level `generate_commentary` entry point.

use crate::analysis::AnalysisKind;
use crate::prompt::build_prompt;
use glossa_config::AppConfig;
use glossa_context::{ContextRelevanceSelector, ContextStore, LoadOptions};
use glossa_core::{ChainState, InvocationResult};
use glossa_providers::{FallbackChain, build_chain};
use glossa_telemetry::OutcomeTracker;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Returned when the subsystem is switched off.
pub const DISABLED_NOTICE: &str = "AI commentary is disabled for this report.";

/// Returned when every candidate failed.
pub const FALLBACK_NOTICE: &str =
    "AI commentary is unavailable: no text-generation service could complete the request.";

/// Returned when the caller cancelled the request.
pub const CANCELLED_NOTICE: &str = "AI commentary was cancelled before it completed.";

/// Generates commentary text for report sections.
///
/// Always returns printable text together with the full
/// [`InvocationResult`], so the caller can both render the section and
/// report which candidate answered.
pub struct CommentaryService {
    /// `None` when the subsystem is disabled.
    chain: Option<Arc<FallbackChain>>,
    selector: ContextRelevanceSelector,
    tracker: Arc<OutcomeTracker>,
    default_budget: usize,
}

impl CommentaryService {
    /// An enabled service over an existing chain. The chain's tracker
    /// becomes the service's tracker.
    pub fn new(
        chain: Arc<FallbackChain>,
        selector: ContextRelevanceSelector,
        default_budget: usize,
    ) -> Self {
        let tracker = Arc::clone(chain.tracker());
        Self {
            chain: Some(chain),
            selector,
            tracker,
            default_budget,
        }
    }

    /// A service that never calls out and answers every request with
    /// [`DISABLED_NOTICE`].
    pub fn disabled(tracker: Arc<OutcomeTracker>) -> Self {
        Self {
            chain: None,
            selector: ContextRelevanceSelector::new(Arc::new(ContextStore::empty())),
            tracker,
            default_budget: 0,
        }
    }

    /// Wire up the service from configuration: load the context store and
    /// build the chain. A disabled configuration loads nothing.
    pub fn from_config(config: &AppConfig, tracker: Arc<OutcomeTracker>) -> glossa_core::Result<Self> {
        if !config.commentary.enabled {
            info!("AI commentary disabled by configuration");
            return Ok(Self::disabled(tracker));
        }

        let options = LoadOptions {
            min_section_chars: config.context.min_section_chars,
            mandatory: config.context.mandatory,
        };
        let store = ContextStore::load(&config.context.dir, &options)?;
        let chain = build_chain(config, tracker)?;

        Ok(Self::new(
            Arc::new(chain),
            ContextRelevanceSelector::new(Arc::new(store)),
            config.commentary.context_budget_chars,
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.chain.is_some()
    }

    pub fn chain(&self) -> Option<&FallbackChain> {
        self.chain.as_deref()
    }

    pub fn selector(&self) -> &ContextRelevanceSelector {
        &self.selector
    }

    pub fn tracker(&self) -> &Arc<OutcomeTracker> {
        &self.tracker
    }

    /// Context budget used by [`commentary_for`](Self::commentary_for).
    pub fn default_budget(&self) -> usize {
        self.default_budget
    }

    /// Generate commentary on `topic`, enriched with up to `budget` chars of
    /// context relevant to `keywords`.
    pub async fn generate_commentary<S: AsRef<str> + Sync>(
        &self,
        topic: &str,
        keywords: &[S],
        budget: usize,
    ) -> (String, InvocationResult) {
        self.generate_commentary_with_cancel(topic, keywords, budget, &CancellationToken::new())
            .await
    }

    /// [`generate_commentary`](Self::generate_commentary) with a caller-held
    /// cancellation token.
    pub async fn generate_commentary_with_cancel<S: AsRef<str> + Sync>(
        &self,
        topic: &str,
        keywords: &[S],
        budget: usize,
        cancel: &CancellationToken,
    ) -> (String, InvocationResult) {
        self.generate(topic, keywords, budget, None, cancel).await
    }

    /// Commentary for one analysis kind, optionally narrowed to a field,
    /// using the configured context budget.
    pub async fn commentary_for(
        &self,
        kind: AnalysisKind,
        field: Option<&str>,
        topic: &str,
    ) -> (String, InvocationResult) {
        self.commentary_for_with_cancel(kind, field, topic, &CancellationToken::new())
            .await
    }

    pub async fn commentary_for_with_cancel(
        &self,
        kind: AnalysisKind,
        field: Option<&str>,
        topic: &str,
        cancel: &CancellationToken,
    ) -> (String, InvocationResult) {
        let query = kind.query(field);
        let instructions = format!("{}\n\n{}", kind.instructions(), AnalysisKind::formatting());
        debug!(kind = %kind, field = field.unwrap_or("-"), "Commentary for analysis kind");
        self.generate(topic, &query, self.default_budget, Some(&instructions), cancel)
            .await
    }

    async fn generate<S: AsRef<str> + Sync>(
        &self,
        topic: &str,
        keywords: &[S],
        budget: usize,
        instructions: Option<&str>,
        cancel: &CancellationToken,
    ) -> (String, InvocationResult) {
        let Some(chain) = &self.chain else {
            let result = InvocationResult::disabled(uuid::Uuid::new_v4().to_string());
            return (DISABLED_NOTICE.to_string(), result);
        };

        let context = self.selector.select(keywords, budget);
        let prompt = build_prompt(topic, &context, instructions);
        debug!(
            context_chars = context.chars().count(),
            prompt_chars = prompt.chars().count(),
            "Commentary prompt assembled"
        );

        let result = chain.run(&prompt, cancel).await;
        (text_for(&result), result)
    }
}

/// The printable text for a finished request.
pub fn text_for(result: &InvocationResult) -> String {
    match (result.state, &result.text) {
        (ChainState::Succeeded, Some(text)) => text.clone(),
        (ChainState::Disabled, _) => DISABLED_NOTICE.to_string(),
        (ChainState::Cancelled, _) => CANCELLED_NOTICE.to_string(),
        _ => FALLBACK_NOTICE.to_string(),
    }
}
