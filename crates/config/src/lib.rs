//! Configuration loading, validation, and management for glossa.
//!
//! Loads configuration from `$GLOSSA_CONFIG` or `~/.glossa/config.toml` with
//! environment variable overrides. Validates all settings at startup; the
//! result is treated as immutable for the rest of the process.

use glossa_core::candidate::{ProviderFamily, ServiceCandidate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Commentary generation settings
    #[serde(default)]
    pub commentary: CommentaryConfig,

    /// Auxiliary context documents
    #[serde(default)]
    pub context: ContextConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Text-generation services, tried in priority order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<CandidateConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentaryConfig {
    /// Master switch for the whole subsystem.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hard deadline for a single candidate attempt.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Character budget for injected context (0 disables context).
    #[serde(default = "default_context_budget_chars")]
    pub context_budget_chars: usize,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_true() -> bool {
    true
}
fn default_attempt_timeout_secs() -> u64 {
    60
}
fn default_context_budget_chars() -> usize {
    4000
}

impl CommentaryConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attempt_timeout_secs: default_attempt_timeout_secs(),
            context_budget_chars: default_context_budget_chars(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Directory holding the context documents.
    #[serde(default = "default_context_dir")]
    pub dir: PathBuf,

    /// Fail at startup if no document can be parsed.
    #[serde(default)]
    pub mandatory: bool,

    /// Sections with a shorter body are dropped.
    #[serde(default = "default_min_section_chars")]
    pub min_section_chars: usize,
}

fn default_context_dir() -> PathBuf {
    PathBuf::from("context")
}
fn default_min_section_chars() -> usize {
    100
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            dir: default_context_dir(),
            mandatory: false,
            min_section_chars: default_min_section_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// One text-generation service.
#[derive(Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Stable identifier shown in reports.
    pub id: String,

    /// Provider family ("openai", "gemini", "openrouter", ...).
    pub family: String,

    /// Model name sent to the service (defaults to `id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Trial rank (defaults to the position in the list).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for CandidateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateConfig")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("model", &self.model)
            .field("priority", &self.priority)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_key_env", &self.api_key_env)
            .finish()
    }
}

impl CandidateConfig {
    pub fn new(id: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family: family.into(),
            model: None,
            priority: None,
            api_url: None,
            api_key: None,
            api_key_env: None,
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.id)
    }

    pub fn family(&self) -> Result<ProviderFamily, ConfigError> {
        self.family.parse().map_err(|e: String| {
            ConfigError::ValidationError(format!("candidate '{}': {e}", self.id))
        })
    }

    /// The endpoint to call: the explicit `api_url` or the family default.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        match &self.api_url {
            Some(url) => Ok(url.clone()),
            None => Ok(self.family()?.default_base_url().to_string()),
        }
    }

    /// Name of the variable the key is read from, if any.
    pub fn key_env_name(&self) -> Option<String> {
        self.api_key_env.clone().or_else(|| {
            self.family()
                .ok()
                .and_then(|f| f.default_api_key_env())
                .map(String::from)
        })
    }

    /// Resolve the API key from config, then from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the API key with a custom variable lookup.
    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        self.key_env_name()
            .and_then(|name| lookup(&name))
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_candidates() -> Vec<CandidateConfig> {
    vec![
        CandidateConfig {
            model: Some("gpt-5.2".into()),
            priority: Some(0),
            api_key_env: Some("OPENAI_API_KEY".into()),
            ..CandidateConfig::new("gpt-5.2", "openai")
        },
        CandidateConfig {
            model: Some("gemini-3-pro-preview".into()),
            priority: Some(1),
            api_key_env: Some("GEMINI_API_KEY".into()),
            ..CandidateConfig::new("gemini-3-pro-preview", "gemini")
        },
    ]
}

impl AppConfig {
    /// Load configuration from `$GLOSSA_CONFIG` or the default path.
    ///
    /// Environment overrides (highest priority):
    /// - `GLOSSA_ENABLED`
    /// - `GLOSSA_ATTEMPT_TIMEOUT_SECS`
    /// - `GLOSSA_CONTEXT_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("GLOSSA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides_with(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using a custom variable lookup.
    pub fn apply_env_overrides_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("GLOSSA_ENABLED") {
            self.commentary.enabled = parse_flag(&value).ok_or_else(|| {
                ConfigError::ValidationError(format!("GLOSSA_ENABLED: not a boolean: '{value}'"))
            })?;
        }

        if let Some(value) = lookup("GLOSSA_ATTEMPT_TIMEOUT_SECS") {
            self.commentary.attempt_timeout_secs = value.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "GLOSSA_ATTEMPT_TIMEOUT_SECS: not a number: '{value}'"
                ))
            })?;
        }

        if let Some(dir) = lookup("GLOSSA_CONTEXT_DIR") {
            self.context.dir = PathBuf::from(dir);
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".glossa")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commentary.attempt_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "attempt_timeout_secs must be > 0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.commentary.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.commentary.enabled && self.candidates.is_empty() {
            return Err(ConfigError::ValidationError(
                "commentary is enabled but no candidates are configured".into(),
            ));
        }

        // Also validates ids, families and priorities.
        self.ordered_candidates()?;
        Ok(())
    }

    /// Candidates with their effective rank, sorted into trial order.
    pub fn ordered_candidates(
        &self,
    ) -> Result<Vec<(ServiceCandidate, &CandidateConfig)>, ConfigError> {
        let mut ids = HashSet::new();
        let mut ranks: Vec<(u32, &str)> = Vec::new();
        let mut ordered = Vec::with_capacity(self.candidates.len());

        for (position, cfg) in self.candidates.iter().enumerate() {
            if cfg.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "candidate id must not be empty".into(),
                ));
            }
            if !ids.insert(cfg.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "candidate '{}' is configured more than once",
                    cfg.id
                )));
            }

            let priority = cfg.priority.unwrap_or(position as u32);
            if let Some((_, other)) = ranks.iter().find(|(rank, _)| *rank == priority) {
                return Err(ConfigError::ValidationError(format!(
                    "candidates '{other}' and '{}' share priority {priority}",
                    cfg.id
                )));
            }
            ranks.push((priority, &cfg.id));

            let family = cfg.family()?;
            ordered.push((ServiceCandidate::new(&cfg.id, family, priority), cfg));
        }

        ordered.sort_by_key(|(candidate, _)| candidate.priority);
        Ok(ordered)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            commentary: CommentaryConfig::default(),
            context: ContextConfig::default(),
            logging: LoggingConfig::default(),
            candidates: default_candidates(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for glossa_core::Error {
    fn from(err: ConfigError) -> Self {
        glossa_core::Error::Config {
            message: err.to_string(),
        }
    }
}
