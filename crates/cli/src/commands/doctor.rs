//! `glossa doctor` — Diagnose configuration, context and credentials.

use glossa_context::{ContextStore, LoadOptions};
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 glossa doctor — system diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config = match crate::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the configuration and run again.");
            return Ok(());
        }
    };

    if config.commentary.enabled {
        println!("  ✅ Commentary enabled");
    } else {
        println!("  ⚠️  Commentary disabled (reports will carry a notice instead)");
    }

    // Context documents
    let dir = &config.context.dir;
    if dir.is_dir() {
        let options = LoadOptions {
            min_section_chars: config.context.min_section_chars,
            mandatory: false,
        };
        match ContextStore::load(dir, &options) {
            Ok(store) if store.is_empty() => {
                println!("  ⚠️  No usable context sections in {}", dir.display());
                issues += 1;
            }
            Ok(store) => {
                println!(
                    "  ✅ Context: {} section(s) from {} document(s)",
                    store.len(),
                    store.documents().len()
                );
                for warning in store.warnings() {
                    println!("  ⚠️  {warning}");
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  ❌ Context unreadable: {e}");
                issues += 1;
            }
        }
    } else if config.context.mandatory {
        println!("  ❌ Context directory {} is missing and mandatory", dir.display());
        issues += 1;
    } else {
        println!(
            "  ⚠️  No context directory at {} (prompts will carry no domain context)",
            dir.display()
        );
    }

    // Credentials
    let ordered = config.ordered_candidates()?;
    let mut usable = 0;
    for (candidate, cfg) in &ordered {
        if !candidate.family.requires_api_key() || cfg.resolve_api_key().is_some() {
            println!("  ✅ {}: credentials available", candidate.id);
            usable += 1;
        } else {
            let env = cfg.key_env_name().unwrap_or_else(|| "api_key".into());
            println!("  ⚠️  {}: no API key (set {env})", candidate.id);
            issues += 1;
        }
    }
    if config.commentary.enabled && usable == 0 {
        println!("  ❌ No candidate can be called; every request will return the fallback notice");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
