pub mod config_cmd;
pub mod context;
pub mod doctor;
pub mod generate;
pub mod providers;
pub mod usage;

use glossa_core::InvocationResult;
use tokio_util::sync::CancellationToken;

/// A token cancelled on Ctrl-C, so an in-flight request ends cleanly.
pub(crate) fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight requests");
            child.cancel();
        }
    });
    token
}

/// One line per attempt: index, candidate, outcome, latency.
pub(crate) fn print_attempts(result: &InvocationResult) {
    for attempt in &result.attempts {
        let (icon, outcome) = match attempt.error {
            None => ("✅", "success".to_string()),
            Some(kind) => ("❌", kind.to_string()),
        };
        println!(
            "  {icon} #{} {:<28} {:<22} {:>7}ms",
            attempt.attempt_index, attempt.candidate_id, outcome, attempt.duration_ms
        );
        if let Some(detail) = &attempt.detail {
            println!("       {detail}");
        }
    }
}
