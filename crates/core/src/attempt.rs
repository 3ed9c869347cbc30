//! Attempts and results — what happened when a request went through the
//! fallback chain.
//!
//! An [`InvocationAttempt`] is one trial of one candidate and is never edited
//! after it is created. An [`InvocationResult`] is the single outcome of a
//! whole request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Classification ────────────────────────────────────────────────────────

/// Why an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    QuotaExceeded,
    RateLimited,
    Timeout,
    NetworkError,
    /// The service answered but the payload was empty or unusable.
    InvalidResponse,
    AuthenticationError,
    /// The caller cancelled the request while the attempt was in flight.
    Cancelled,
}

impl FailureKind {
    /// Whether the chain may move on after this failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded => write!(f, "quota_exceeded"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Timeout => write!(f, "timeout"),
            Self::NetworkError => write!(f, "network_error"),
            Self::InvalidResponse => write!(f, "invalid_response"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Coarse outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    RecoverableFailure,
    FatalFailure,
}

impl OutcomeKind {
    /// The outcome implied by an optional failure.
    pub fn from_failure(failure: Option<FailureKind>) -> Self {
        match failure {
            None => Self::Success,
            Some(kind) if kind.is_recoverable() => Self::RecoverableFailure,
            Some(_) => Self::FatalFailure,
        }
    }
}

// ── Attempt ───────────────────────────────────────────────────────────────

/// One trial of one candidate for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationAttempt {
    /// The request this attempt belongs to.
    pub request_id: String,
    /// Which candidate was tried.
    pub candidate_id: String,
    /// Position within the request's attempt sequence (0-based).
    pub attempt_index: usize,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Coarse outcome.
    pub outcome: OutcomeKind,
    /// Failure classification, if the attempt failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
    /// Human-readable failure detail from the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl InvocationAttempt {
    /// A successful attempt.
    pub fn success(
        request_id: impl Into<String>,
        candidate_id: impl Into<String>,
        attempt_index: usize,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            candidate_id: candidate_id.into(),
            attempt_index,
            started_at,
            duration_ms,
            outcome: OutcomeKind::Success,
            error: None,
            detail: None,
        }
    }

    /// A failed attempt.
    pub fn failure(
        request_id: impl Into<String>,
        candidate_id: impl Into<String>,
        attempt_index: usize,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            candidate_id: candidate_id.into(),
            attempt_index,
            started_at,
            duration_ms,
            outcome: OutcomeKind::from_failure(Some(kind)),
            error: Some(kind),
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == OutcomeKind::Success
    }
}

// ── Chain state ───────────────────────────────────────────────────────────

/// State of a request moving through the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChainState {
    /// Not started yet.
    Pending,
    /// About to try the candidate at `candidate` (index into the ordered
    /// chain). `retried` is set once the candidate got its single retry.
    Trying { candidate: usize, retried: bool },
    /// A candidate produced usable text.
    Succeeded,
    /// Every candidate failed.
    Exhausted,
    /// The caller cancelled the request.
    Cancelled,
    /// The subsystem is switched off; nothing was attempted.
    Disabled,
}

impl ChainState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Trying { .. })
    }
}

impl std::fmt::Display for ChainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Trying { candidate, .. } => write!(f, "trying({candidate})"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

// ── Result ────────────────────────────────────────────────────────────────

/// The outcome of one top-level request. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub request_id: String,
    /// Terminal state the request ended in.
    pub state: ChainState,
    /// Generated text; present iff `state == Succeeded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The candidate that produced `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded_candidate: Option<String>,
    /// Every attempt, in order.
    pub attempts: Vec<InvocationAttempt>,
    /// Total wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

impl InvocationResult {
    /// A result for a request that never reached the chain.
    pub fn disabled(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: ChainState::Disabled,
            text: None,
            succeeded_candidate: None,
            attempts: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == ChainState::Succeeded
    }

    pub fn total_attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Candidates that rejected their credentials, in trial order, deduplicated.
    pub fn authentication_failures(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for attempt in &self.attempts {
            if attempt.error == Some(FailureKind::AuthenticationError)
                && !ids.contains(&attempt.candidate_id.as_str())
            {
                ids.push(&attempt.candidate_id);
            }
        }
        ids
    }

    /// Human-readable account of every attempt.
    ///
    /// Authentication failures are called out separately because they point
    /// at configuration rather than transient unavailability.
    pub fn failure_report(&self) -> String {
        let mut out = format!(
            "request {} {} after {} attempt(s) in {}ms",
            self.request_id,
            self.state,
            self.attempts.len(),
            self.elapsed_ms
        );
        for attempt in &self.attempts {
            let outcome = match attempt.error {
                Some(kind) => kind.to_string(),
                None => "success".to_string(),
            };
            out.push_str(&format!(
                "\n  #{} {} -> {} ({}ms)",
                attempt.attempt_index, attempt.candidate_id, outcome, attempt.duration_ms
            ));
            if let Some(detail) = &attempt.detail {
                out.push_str(&format!(": {detail}"));
            }
        }
        let auth = self.authentication_failures();
        if !auth.is_empty() {
            out.push_str(&format!(
                "\n  credentials rejected by: {} (check configuration)",
                auth.join(", ")
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(index: usize, candidate: &str, kind: FailureKind) -> InvocationAttempt {
        InvocationAttempt::failure("req-1", candidate, index, Utc::now(), 5, kind, "boom")
    }

    #[test]
    fn only_cancellation_is_fatal() {
        assert!(FailureKind::Timeout.is_recoverable());
        assert!(FailureKind::AuthenticationError.is_recoverable());
        assert!(FailureKind::InvalidResponse.is_recoverable());
        assert!(!FailureKind::Cancelled.is_recoverable());
        assert_eq!(
            OutcomeKind::from_failure(Some(FailureKind::Cancelled)),
            OutcomeKind::FatalFailure
        );
        assert_eq!(OutcomeKind::from_failure(None), OutcomeKind::Success);
    }

    #[test]
    fn failure_constructor_sets_outcome() {
        let attempt = failed(0, "a", FailureKind::RateLimited);
        assert_eq!(attempt.outcome, OutcomeKind::RecoverableFailure);
        assert_eq!(attempt.error, Some(FailureKind::RateLimited));
        assert!(!attempt.is_success());
    }

    #[test]
    fn terminal_states() {
        assert!(!ChainState::Pending.is_terminal());
        assert!(
            !ChainState::Trying {
                candidate: 0,
                retried: false
            }
            .is_terminal()
        );
        assert!(ChainState::Exhausted.is_terminal());
        assert!(ChainState::Disabled.is_terminal());
    }

    #[test]
    fn failure_report_surfaces_authentication_errors() {
        let result = InvocationResult {
            request_id: "req-1".into(),
            state: ChainState::Exhausted,
            text: None,
            succeeded_candidate: None,
            attempts: vec![
                failed(0, "openai", FailureKind::AuthenticationError),
                failed(1, "gemini", FailureKind::Timeout),
            ],
            elapsed_ms: 12,
        };

        assert_eq!(result.authentication_failures(), vec!["openai"]);
        let report = result.failure_report();
        assert!(report.contains("exhausted"));
        assert!(report.contains("#1 gemini -> timeout"));
        assert!(report.contains("credentials rejected by: openai"));
    }

    #[test]
    fn disabled_result_has_no_attempts() {
        let result = InvocationResult::disabled("req-9");
        assert_eq!(result.state, ChainState::Disabled);
        assert_eq!(result.total_attempts(), 0);
        assert!(!result.is_success());
    }

    #[test]
    fn attempt_serialization_skips_empty_error() {
        let attempt = InvocationAttempt::success("req-1", "a", 0, Utc::now(), 3);
        let json = serde_json::to_string(&attempt).unwrap();
        assert!(json.contains("\"outcome\":\"success\""));
        assert!(!json.contains("\"error\""));
    }
}
