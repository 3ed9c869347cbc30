//! `glossa providers` — Show the configured fallback chain.

use glossa_providers::build_chain;
use glossa_telemetry::OutcomeTracker;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: Option<&Path>, check: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = crate::load_config(config_path)?;
    let ordered = config.ordered_candidates()?;

    println!("🤖 Fallback chain (trial order)");
    println!("==============================");
    println!();
    println!(
        "  {:>4}  {:<24} {:<11} {:<24} {:<8}",
        "Rank", "Candidate", "Family", "Model", "Key"
    );
    for (candidate, cfg) in &ordered {
        let key = if !candidate.family.requires_api_key() {
            "n/a"
        } else if cfg.resolve_api_key().is_some() {
            "set"
        } else {
            "missing"
        };
        println!(
            "  {:>4}  {:<24} {:<11} {:<24} {:<8}",
            candidate.priority,
            candidate.id,
            candidate.family.to_string(),
            cfg.model(),
            key
        );
        println!("        {}", cfg.base_url()?);
    }
    println!();
    println!(
        "  Per-attempt timeout: {}s",
        config.commentary.attempt_timeout_secs
    );
    if !config.commentary.enabled {
        println!("  ⚠️  Commentary is disabled; the chain is never called.");
    }

    if check {
        println!();
        println!("🩺 Endpoint health");
        let chain = build_chain(&config, Arc::new(OutcomeTracker::new()))?;
        for (id, health) in chain.health().await {
            match health {
                Ok(true) => println!("  ✅ {id}"),
                Ok(false) => println!("  ⚠️  {id}: endpoint reported unhealthy"),
                Err(e) => println!("  ❌ {id}: {e}"),
            }
        }
    }

    Ok(())
}
