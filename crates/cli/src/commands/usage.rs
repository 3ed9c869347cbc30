//! `glossa usage` — Run a batch of topics concurrently and report which
//! model answered each request.

use glossa_commentary::CommentaryService;
use glossa_telemetry::OutcomeTracker;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Non-empty, non-comment lines of a topics file.
pub(crate) fn parse_topics(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

pub async fn run(
    config_path: Option<&Path>,
    topics_file: &Path,
    keywords: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = crate::load_config(config_path)?;
    let content = std::fs::read_to_string(topics_file)
        .map_err(|e| format!("Failed to read {}: {e}", topics_file.display()))?;
    let topics = parse_topics(&content);
    if topics.is_empty() {
        return Err(format!("{} contains no topics", topics_file.display()).into());
    }

    let tracker = Arc::new(OutcomeTracker::new());
    let service = Arc::new(CommentaryService::from_config(&config, Arc::clone(&tracker))?);
    let keywords = Arc::new(keywords);
    let cancel = super::ctrl_c_token();
    let started = chrono::Utc::now();

    let mut tasks = JoinSet::new();
    for (line, topic) in topics.into_iter().enumerate() {
        let service = Arc::clone(&service);
        let keywords = Arc::clone(&keywords);
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let budget = service.default_budget();
            let (_, result) = service
                .generate_commentary_with_cancel(&topic, keywords.as_slice(), budget, &cancel)
                .await;
            (line, topic, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(line, _, _)| *line);

    let summary = tracker.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "📊 Usage for {} request(s) started {}",
        results.len(),
        started.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("─────────────────────────────────────");
    for (line, topic, result) in &results {
        let answered = result.succeeded_candidate.as_deref().unwrap_or("-");
        println!(
            "  {:>3}. {:<40} {:<10} {:<24} {} attempt(s)",
            line + 1,
            truncate(topic, 40),
            result.state.to_string(),
            answered,
            result.attempts.len()
        );
    }
    println!();
    println!("{}", summary.to_markdown());

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
