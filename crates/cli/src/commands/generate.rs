//! `glossa generate` — Generate commentary for one topic.

use clap::Args;
use glossa_commentary::{AnalysisKind, CommentaryService};
use glossa_telemetry::OutcomeTracker;
use std::path::Path;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// What the commentary is about
    #[arg(short, long)]
    pub topic: String,

    /// Analysis kind: data_summary, error_patterns, chart_commentary, general
    #[arg(long)]
    pub kind: Option<AnalysisKind>,

    /// Narrow the context to one field
    #[arg(short, long)]
    pub field: Option<String>,

    /// Comma-separated context keywords (merged with the kind's defaults)
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Context budget in characters (defaults to the configured budget)
    #[arg(short, long)]
    pub budget: Option<usize>,
}

pub async fn run(config_path: Option<&Path>, args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = crate::load_config(config_path)?;
    let tracker = Arc::new(OutcomeTracker::new());
    let service = CommentaryService::from_config(&config, Arc::clone(&tracker))?;
    let cancel = super::ctrl_c_token();

    let (text, result) = if args.keywords.is_empty() && args.budget.is_none() {
        let kind = args.kind.unwrap_or(AnalysisKind::General);
        service
            .commentary_for_with_cancel(kind, args.field.as_deref(), &args.topic, &cancel)
            .await
    } else {
        let mut keywords = args.keywords.clone();
        if let Some(kind) = args.kind {
            keywords.extend(kind.query(args.field.as_deref()));
        } else if let Some(field) = args.field.as_deref() {
            keywords.push(field.to_lowercase());
        }
        let budget = args.budget.unwrap_or(service.default_budget());
        service
            .generate_commentary_with_cancel(&args.topic, &keywords, budget, &cancel)
            .await
    };

    println!("📝 Commentary");
    println!("─────────────────────────────────────");
    println!("{text}");
    println!();

    println!("🔁 Attempts ({}, request {})", result.state, result.request_id);
    println!("─────────────────────────────────────");
    if result.attempts.is_empty() {
        println!("  (none)");
    } else {
        super::print_attempts(&result);
    }
    if let Some(candidate) = &result.succeeded_candidate {
        println!();
        println!("  Answered by: {candidate}");
    }
    let rejected = result.authentication_failures();
    if !rejected.is_empty() {
        println!("  ⚠️  Credentials rejected by: {}", rejected.join(", "));
    }
    println!();

    if !tracker.is_empty() {
        println!("📊 Usage");
        println!("─────────────────────────────────────");
        println!("{}", tracker.summary().to_markdown());
    }

    Ok(())
}
