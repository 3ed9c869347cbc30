//! Thread-safe, append-only attempt log.

use crate::model::{CandidateSummary, RequestServed, UsageSummary};
use glossa_core::InvocationAttempt;
use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Records every attempt made by every request.
///
/// Shared as `Arc<OutcomeTracker>` by all in-flight requests. Appends take
/// the write lock only for the push; summaries are recomputed from the full
/// log on every call, so no derived counter can drift from the log.
///
/// Entries are never edited or removed, which makes a poisoned lock safe to
/// recover: the log it guards is still a valid prefix.
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    attempts: RwLock<Vec<InvocationAttempt>>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> RwLockReadGuard<'_, Vec<InvocationAttempt>> {
        self.attempts.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one attempt.
    pub fn record(&self, attempt: InvocationAttempt) {
        tracing::trace!(
            request_id = %attempt.request_id,
            candidate = %attempt.candidate_id,
            attempt = attempt.attempt_index,
            outcome = ?attempt.outcome,
            "Recording attempt"
        );
        self.attempts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attempt);
    }

    /// Snapshot of the whole log, in append order.
    pub fn attempts(&self) -> Vec<InvocationAttempt> {
        self.log().clone()
    }

    /// Attempts belonging to one request, ordered by attempt index.
    pub fn attempts_for(&self, request_id: &str) -> Vec<InvocationAttempt> {
        let mut attempts: Vec<InvocationAttempt> = self
            .log()
            .iter()
            .filter(|a| a.request_id == request_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.attempt_index);
        attempts
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    /// Fold the full log into per-candidate aggregates.
    pub fn summary(&self) -> UsageSummary {
        let log = self.log();

        let mut candidates: BTreeMap<String, CandidateSummary> = BTreeMap::new();
        let mut latency: BTreeMap<String, u64> = BTreeMap::new();
        let mut requests: HashSet<&str> = HashSet::new();
        let mut successful_attempts = 0u64;

        for attempt in log.iter() {
            requests.insert(&attempt.request_id);

            let entry = candidates.entry(attempt.candidate_id.clone()).or_default();
            entry.attempts += 1;
            *latency.entry(attempt.candidate_id.clone()).or_default() += attempt.duration_ms;

            match attempt.error {
                None => {
                    entry.successes += 1;
                    successful_attempts += 1;
                }
                Some(kind) => *entry.failures.entry(kind).or_default() += 1,
            }
        }

        for (id, summary) in candidates.iter_mut() {
            let total = latency.get(id).copied().unwrap_or(0);
            summary.mean_latency_ms = total as f64 / summary.attempts as f64;
        }

        UsageSummary {
            candidates,
            total_attempts: log.len() as u64,
            successful_attempts,
            request_count: requests.len() as u64,
        }
    }

    /// The candidate that answered most requests, if any succeeded.
    pub fn primary_candidate(&self) -> Option<String> {
        self.summary().primary_candidate().map(str::to_string)
    }

    /// Which candidate served each request, in first-seen request order.
    pub fn served_by(&self) -> Vec<RequestServed> {
        let log = self.log();
        let mut order: Vec<RequestServed> = Vec::new();
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();

        for attempt in log.iter() {
            let slot = *index.entry(&attempt.request_id).or_insert_with(|| {
                order.push(RequestServed {
                    request_id: attempt.request_id.clone(),
                    candidate: None,
                    attempts: 0,
                });
                order.len() - 1
            });
            let served = &mut order[slot];
            served.attempts += 1;
            if attempt.is_success() {
                served.candidate = Some(attempt.candidate_id.clone());
            }
        }
        order
    }
}
