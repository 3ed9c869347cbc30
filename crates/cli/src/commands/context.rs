//! `glossa context` — Show which domain context a query selects.

use glossa_context::{ContextRelevanceSelector, ContextStore, LoadOptions};
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    config_path: Option<&Path>,
    keywords: Vec<String>,
    budget: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = crate::load_config(config_path)?;
    let options = LoadOptions {
        min_section_chars: config.context.min_section_chars,
        mandatory: config.context.mandatory,
    };
    let store = ContextStore::load(&config.context.dir, &options)?;
    let budget = budget.unwrap_or(config.commentary.context_budget_chars);

    println!("📚 Context store: {}", config.context.dir.display());
    println!(
        "   {} document(s), {} section(s)",
        store.documents().len(),
        store.len()
    );
    for warning in store.warnings() {
        println!("   ⚠️  {warning}");
    }
    println!();

    let selector = ContextRelevanceSelector::new(Arc::new(store));
    let ranked = selector.rank(&keywords);

    println!("🔎 Ranked sections for [{}]", keywords.join(", "));
    println!("─────────────────────────────────────");
    if ranked.is_empty() {
        println!("  (no section matches)");
    }
    for scored in &ranked {
        println!(
            "  {:>3}  {} › {} ({} chars)",
            scored.score,
            scored.section.document_id,
            scored.section.heading,
            scored.section.rendered_len()
        );
    }
    println!();

    let selection = selector.select_detailed(&keywords, budget);
    println!(
        "✂️  Selected {} section(s), {} skipped, {}/{} chars",
        selection.included.len(),
        selection.skipped,
        selection.text.chars().count(),
        budget
    );
    println!("─────────────────────────────────────");
    if selection.is_empty() {
        println!("  (empty)");
    } else {
        println!("{}", selection.text);
    }

    Ok(())
}
