//! Chain construction — turns configured candidates into a [`FallbackChain`].
//!
//! Every candidate family speaks the OpenAI-compatible protocol, so each
//! becomes an [`OpenAiCompatProvider`]. A candidate whose required key is
//! missing still joins the chain as a
//! [`MissingKeyProvider`](crate::openai_compat::MissingKeyProvider): its attempts
//! fail as authentication errors and show up in the failure report instead
//! of silently shortening the chain.

use crate::fallback::FallbackChain;
use crate::openai_compat::OpenAiCompatProvider;
use glossa_config::{AppConfig, CandidateConfig, ConfigError};
use glossa_core::Provider;
use glossa_telemetry::OutcomeTracker;
use std::sync::Arc;
use tracing::{debug, warn};

/// Build the fallback chain described by `config`, reading API keys from
/// the process environment.
pub fn build_chain(
    config: &AppConfig,
    tracker: Arc<OutcomeTracker>,
) -> glossa_core::Result<FallbackChain> {
    build_chain_with(config, tracker, |name| std::env::var(name).ok())
}

/// Build the fallback chain with a custom variable lookup for API keys.
pub fn build_chain_with(
    config: &AppConfig,
    tracker: Arc<OutcomeTracker>,
    lookup: impl Fn(&str) -> Option<String>,
) -> glossa_core::Result<FallbackChain> {
    let mut builder = FallbackChain::builder(tracker)
        .attempt_timeout(config.commentary.attempt_timeout())
        .temperature(config.commentary.temperature)
        .max_tokens(config.commentary.max_tokens);

    for (candidate, cfg) in config.ordered_candidates()? {
        let provider = build_provider(cfg, &lookup)?;
        debug!(candidate = %candidate.id, priority = candidate.priority, "Chain candidate");
        builder = builder.candidate(candidate, provider);
    }

    Ok(builder.build()?)
}

/// Build the provider for one configured candidate.
pub fn build_provider(
    cfg: &CandidateConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn Provider>, ConfigError> {
    let family = cfg.family()?;
    let base_url = cfg.base_url()?;
    let api_key = cfg.resolve_api_key_with(lookup);

    let provider: Arc<dyn Provider> = match api_key {
        Some(key) => Arc::new(OpenAiCompatProvider::new(
            &cfg.id,
            base_url,
            cfg.model(),
            Some(key),
        )),
        None if family.requires_api_key() => {
            let key_env = cfg.key_env_name().unwrap_or_else(|| "api_key".into());
            warn!(candidate = %cfg.id, env = %key_env, "No API key configured for candidate");
            Arc::new(OpenAiCompatProvider::missing_key(
                &cfg.id,
                base_url,
                cfg.model(),
                &key_env,
            ))
        }
        None => Arc::new(OpenAiCompatProvider::new(&cfg.id, base_url, cfg.model(), None)),
    };
    Ok(provider)
}
