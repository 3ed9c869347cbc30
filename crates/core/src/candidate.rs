//! Service candidates — the interchangeable text-generation services a
//! request may be routed to, in priority order.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The API family a candidate belongs to.
///
/// Every family speaks an OpenAI-compatible chat completions dialect; the
/// family only determines the default endpoint and credential variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenAi,
    OpenRouter,
    Gemini,
    Groq,
    DeepSeek,
    Ollama,
    Custom,
}

impl ProviderFamily {
    /// Default base URL for the family's OpenAI-compatible endpoint.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::Custom => "http://localhost:8000/v1",
        }
    }

    /// The environment variable conventionally holding this family's API key.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Self::Ollama | Self::Custom => None,
        }
    }

    /// Whether requests to this family need an API key at all.
    pub fn requires_api_key(&self) -> bool {
        self.default_api_key_env().is_some()
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::OpenRouter => write!(f, "openrouter"),
            Self::Gemini => write!(f, "gemini"),
            Self::Groq => write!(f, "groq"),
            Self::DeepSeek => write!(f, "deepseek"),
            Self::Ollama => write!(f, "ollama"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ProviderFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "gemini" | "google" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            "deepseek" => Ok(Self::DeepSeek),
            "ollama" => Ok(Self::Ollama),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown provider family '{other}'")),
        }
    }
}

/// One configured text-generation service.
///
/// Immutable once built. `priority` is unique across a chain and is the
/// only thing that decides trial order (lower ranks are tried first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCandidate {
    /// Stable identifier, used in logs, attempts and usage tables.
    pub id: String,
    /// The API family this candidate belongs to.
    pub family: ProviderFamily,
    /// Trial rank; lower is tried first.
    pub priority: u32,
}

impl ServiceCandidate {
    pub fn new(id: impl Into<String>, family: ProviderFamily, priority: u32) -> Self {
        Self {
            id: id.into(),
            family,
            priority,
        }
    }
}
