//! `glossa config` — Configuration management commands.

use glossa_config::AppConfig;
use std::path::Path;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match crate::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            println!();
            println!(
                "   Enabled:     {}",
                if config.commentary.enabled { "yes" } else { "no" }
            );
            println!("   Timeout:     {}s per attempt", config.commentary.attempt_timeout_secs);
            println!("   Budget:      {} chars", config.commentary.context_budget_chars);
            println!("   Context dir: {}", config.context.dir.display());
            let chain: Vec<String> = config
                .ordered_candidates()?
                .into_iter()
                .map(|(candidate, _)| candidate.id)
                .collect();
            println!("   Chain:       {}", chain.join(" → "));
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Print the effective configuration with inline keys redacted.
pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        crate::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    redact_keys(&mut config);
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    println!("{}", path.display());
    Ok(())
}

pub async fn default() -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", AppConfig::default_toml());
    Ok(())
}

fn redact_keys(config: &mut AppConfig) {
    for candidate in &mut config.candidates {
        if candidate.api_key.is_some() {
            candidate.api_key = Some("[REDACTED]".into());
        }
    }
}
