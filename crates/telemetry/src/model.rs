//! Summary types derived from the attempt log.

use glossa_core::FailureKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated outcomes of one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    /// Attempts made against this candidate.
    pub attempts: u64,
    /// Attempts that produced usable text.
    pub successes: u64,
    /// Failed attempts by kind.
    pub failures: BTreeMap<FailureKind, u64>,
    /// Mean wall-clock duration over all attempts.
    pub mean_latency_ms: f64,
}

impl CandidateSummary {
    pub fn failure_count(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Fraction of attempts that succeeded, in `[0, 1]`.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

/// Which candidate answered one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestServed {
    pub request_id: String,
    /// `None` when every attempt of the request failed.
    pub candidate: Option<String>,
    pub attempts: u64,
}

/// Usage summary over the whole attempt log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Per-candidate aggregates keyed by candidate id.
    pub candidates: BTreeMap<String, CandidateSummary>,
    pub total_attempts: u64,
    pub successful_attempts: u64,
    /// Distinct request ids seen in the log.
    pub request_count: u64,
}

impl UsageSummary {
    /// The candidate with the most successes; ties go to the smaller id.
    pub fn primary_candidate(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter(|(_, c)| c.successes > 0)
            // Ids iterate ascending; equal counts keep the earlier id.
            .fold(None::<(&String, u64)>, |best, (id, c)| match best {
                Some((_, n)) if n >= c.successes => best,
                _ => Some((id, c.successes)),
            })
            .map(|(id, _)| id.as_str())
    }

    /// Render the summary as a markdown table, one row per candidate.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from(
            "| Candidate | Attempts | Successes | Failures | Mean latency (ms) |\n\
             |---|---:|---:|---|---:|\n",
        );
        for (id, c) in &self.candidates {
            let failures = if c.failures.is_empty() {
                "-".to_string()
            } else {
                c.failures
                    .iter()
                    .map(|(kind, n)| format!("{kind}: {n}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            out.push_str(&format!(
                "| {} | {} | {} | {} | {:.0} |\n",
                id, c.attempts, c.successes, failures, c.mean_latency_ms
            ));
        }
        out.push_str(&format!(
            "\n{} request(s), {} attempt(s), {} successful",
            self.request_count, self.total_attempts, self.successful_attempts
        ));
        if let Some(primary) = self.primary_candidate() {
            out.push_str(&format!("; primary candidate: {primary}"));
        }
        out.push('\n');
        out
    }
}
