//! Fallback chain — ordered candidates, one deadline per attempt.
//!
//! A request walks the candidates in ascending priority. Each attempt is
//! raced against the attempt deadline and the caller's cancellation token;
//! whichever settles first decides the outcome, and the losing provider
//! future is dropped so a late answer can never be observed. Every attempt
//! is classified, recorded in the [`OutcomeTracker`], and fed to
//! [`next_state`] to decide whether to retry, advance or stop.

use chrono::Utc;
use glossa_core::error::{ChainError, ProviderError};
use glossa_core::{
    ChainState, Completion, CompletionRequest, FailureKind, InvocationAttempt, InvocationResult,
    Provider, ServiceCandidate,
};
use glossa_telemetry::OutcomeTracker;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default per-attempt deadline.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// One entry in the chain.
struct ChainLink {
    candidate: ServiceCandidate,
    provider: Arc<dyn Provider>,
}

/// Decide the state after an attempt.
///
/// `outcome` is `None` for a success. From `Pending` the outcome is ignored
/// and the first candidate is selected. Terminal states never change.
pub fn next_state(
    current: ChainState,
    outcome: Option<FailureKind>,
    candidates: usize,
) -> ChainState {
    match current {
        ChainState::Pending if candidates == 0 => ChainState::Exhausted,
        ChainState::Pending => ChainState::Trying {
            candidate: 0,
            retried: false,
        },
        ChainState::Trying { candidate, retried } => match outcome {
            None => ChainState::Succeeded,
            Some(FailureKind::Cancelled) => ChainState::Cancelled,
            Some(FailureKind::InvalidResponse) if !retried => ChainState::Trying {
                candidate,
                retried: true,
            },
            Some(_) if candidate + 1 < candidates => ChainState::Trying {
                candidate: candidate + 1,
                retried: false,
            },
            Some(_) => ChainState::Exhausted,
        },
        terminal => terminal,
    }
}

/// Builder for [`FallbackChain`].
pub struct FallbackChainBuilder {
    tracker: Arc<OutcomeTracker>,
    attempt_timeout: Duration,
    temperature: f32,
    max_tokens: Option<u32>,
    links: Vec<ChainLink>,
}

impl FallbackChainBuilder {
    /// Deadline applied to every attempt.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Add a candidate and the provider that serves it.
    pub fn candidate(mut self, candidate: ServiceCandidate, provider: Arc<dyn Provider>) -> Self {
        self.links.push(ChainLink {
            candidate,
            provider,
        });
        self
    }

    /// Order candidates by priority and check that ids and priorities are
    /// unique.
    pub fn build(mut self) -> Result<FallbackChain, ChainError> {
        if self.links.is_empty() {
            return Err(ChainError::Empty);
        }

        let mut seen = HashSet::new();
        for link in &self.links {
            if !seen.insert(link.candidate.id.as_str()) {
                return Err(ChainError::DuplicateCandidate(link.candidate.id.clone()));
            }
        }

        self.links.sort_by_key(|l| l.candidate.priority);
        for pair in self.links.windows(2) {
            if pair[0].candidate.priority == pair[1].candidate.priority {
                return Err(ChainError::DuplicatePriority {
                    priority: pair[0].candidate.priority,
                    first: pair[0].candidate.id.clone(),
                    second: pair[1].candidate.id.clone(),
                });
            }
        }

        Ok(FallbackChain {
            links: self.links,
            attempt_timeout: self.attempt_timeout,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tracker: self.tracker,
        })
    }
}

/// An immutable, priority-ordered list of candidates.
///
/// Cheap to share: concurrent requests each run their own state machine
/// over the same chain and only meet in the tracker.
pub struct FallbackChain {
    links: Vec<ChainLink>,
    attempt_timeout: Duration,
    temperature: f32,
    max_tokens: Option<u32>,
    tracker: Arc<OutcomeTracker>,
}

impl FallbackChain {
    pub fn builder(tracker: Arc<OutcomeTracker>) -> FallbackChainBuilder {
        FallbackChainBuilder {
            tracker,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            temperature: 0.0,
            max_tokens: None,
            links: Vec::new(),
        }
    }

    /// Candidates in trial order.
    pub fn candidates(&self) -> impl Iterator<Item = &ServiceCandidate> {
        self.links.iter().map(|l| &l.candidate)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn tracker(&self) -> &Arc<OutcomeTracker> {
        &self.tracker
    }

    /// Run `prompt` through the chain under a fresh request id.
    pub async fn run(&self, prompt: &str, cancel: &CancellationToken) -> InvocationResult {
        self.run_with_id(uuid::Uuid::new_v4().to_string(), prompt, cancel)
            .await
    }

    /// Run `prompt` through the chain. Never fails: every outcome, including
    /// exhaustion and cancellation, is a terminal state of the result.
    pub async fn run_with_id(
        &self,
        request_id: impl Into<String>,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> InvocationResult {
        let request_id = request_id.into();
        let started = Instant::now();
        let mut attempts: Vec<InvocationAttempt> = Vec::new();
        let mut text = None;
        let mut succeeded_candidate = None;
        let mut state = next_state(ChainState::Pending, None, self.links.len());

        while let ChainState::Trying { candidate, retried } = state {
            if cancel.is_cancelled() {
                info!(request_id = %request_id, "Request cancelled before next attempt");
                state = ChainState::Cancelled;
                break;
            }

            let link = &self.links[candidate];
            let candidate_id = link.candidate.id.as_str();
            let attempt_index = attempts.len();
            info!(
                request_id = %request_id,
                candidate = %candidate_id,
                attempt = attempt_index,
                retry = retried,
                total = self.links.len(),
                "Fallback: trying candidate"
            );

            let started_at = Utc::now();
            let clock = Instant::now();
            let outcome = self.invoke(link, prompt, cancel).await;
            let duration_ms = clock.elapsed().as_millis() as u64;

            let (attempt, failure) = match outcome {
                Ok(completion) => {
                    text = Some(completion.text);
                    succeeded_candidate = Some(candidate_id.to_string());
                    let attempt = InvocationAttempt::success(
                        &request_id,
                        candidate_id,
                        attempt_index,
                        started_at,
                        duration_ms,
                    );
                    (attempt, None)
                }
                Err((kind, detail)) => {
                    if kind == FailureKind::AuthenticationError {
                        warn!(
                            request_id = %request_id,
                            candidate = %candidate_id,
                            error = %detail,
                            "Fallback: credentials rejected, check configuration"
                        );
                    } else {
                        warn!(
                            request_id = %request_id,
                            candidate = %candidate_id,
                            kind = %kind,
                            error = %detail,
                            "Fallback: candidate failed"
                        );
                    }
                    let attempt = InvocationAttempt::failure(
                        &request_id,
                        candidate_id,
                        attempt_index,
                        started_at,
                        duration_ms,
                        kind,
                        detail,
                    );
                    (attempt, Some(kind))
                }
            };

            self.tracker.record(attempt.clone());
            attempts.push(attempt);
            state = next_state(state, failure, self.links.len());
        }

        let result = InvocationResult {
            request_id,
            state,
            text,
            succeeded_candidate,
            attempts,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        match result.state {
            ChainState::Succeeded => info!(
                request_id = %result.request_id,
                candidate = result.succeeded_candidate.as_deref().unwrap_or_default(),
                attempts = result.total_attempts(),
                elapsed_ms = result.elapsed_ms,
                "Fallback: request served"
            ),
            ChainState::Exhausted => warn!(
                request_id = %result.request_id,
                report = %result.failure_report(),
                "Fallback: all candidates failed"
            ),
            _ => {}
        }
        result
    }

    /// One attempt against one candidate, settled by whichever of response,
    /// deadline or cancellation comes first.
    async fn invoke(
        &self,
        link: &ChainLink,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Completion, (FailureKind, String)> {
        let request = CompletionRequest::new(prompt, self.attempt_timeout)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                Err((FailureKind::Cancelled, "cancelled by caller".to_string()))
            }
            settled = tokio::time::timeout(self.attempt_timeout, link.provider.complete(request)) => {
                match settled {
                    Err(_) => Err((
                        FailureKind::Timeout,
                        format!("no response within {}s", self.attempt_timeout.as_secs_f64()),
                    )),
                    Ok(Ok(completion)) if completion.text.trim().is_empty() => Err((
                        FailureKind::InvalidResponse,
                        "provider returned empty text".to_string(),
                    )),
                    Ok(Ok(completion)) => Ok(completion),
                    Ok(Err(e)) => Err((e.failure_kind(), e.to_string())),
                }
            }
        }
    }

    /// Health of every provider, in trial order.
    pub async fn health(&self) -> Vec<(String, Result<bool, ProviderError>)> {
        let mut report = Vec::with_capacity(self.links.len());
        for link in &self.links {
            report.push((link.candidate.id.clone(), link.provider.health_check().await));
        }
        report
    }
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("candidates", &self.candidates().collect::<Vec<_>>())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}
