//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Gemini (OpenAI endpoint), Groq,
//! DeepSeek, Ollama, vLLM, and any endpoint that exposes
//! `/chat/completions`.
//!
//! HTTP failures are mapped onto [`ProviderError`] so the fallback chain can
//! classify them without knowing the wire format.

use async_trait::async_trait;
use glossa_core::error::ProviderError;
use glossa_core::provider::{Completion, CompletionRequest, Provider, Usage};
use serde::Deserialize;
use tracing::{debug, warn};

/// Retry hint used when a 429 carries no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// An OpenAI-compatible text-generation provider bound to one model.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider. `api_key` of `None` means the endpoint needs no
    /// credential; pass [`OpenAiCompatProvider::missing_key`] instead when
    /// one is required but absent.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// A provider whose required credential is missing. Every call fails
    /// with `NotConfigured` naming `key_env`, so the chain records the
    /// defect and moves on.
    pub fn missing_key(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        key_env: &str,
    ) -> MissingKeyProvider {
        MissingKeyProvider {
            inner: Self::new(name, base_url, model, None),
            key_env: key_env.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }
}

/// Map a non-success HTTP status and its body onto a provider error.
pub fn error_for_status(status: u16, body: &str, retry_after: Option<u64>) -> ProviderError {
    let message = error_message(body);
    match status {
        429 if is_quota_error(body) => ProviderError::QuotaExceeded(message),
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        401 | 403 => ProviderError::AuthenticationFailed(message),
        402 => ProviderError::QuotaExceeded(message),
        408 | 504 => ProviderError::Timeout(message),
        500..=599 => ProviderError::Network(format!("server error {status}: {message}")),
        _ => ProviderError::ApiError {
            status_code: status,
            message,
        },
    }
}

fn is_quota_error(body: &str) -> bool {
    body.contains("insufficient_quota") || body.contains("RESOURCE_EXHAUSTED")
}

/// The provider's error message, or the raw body when it is not JSON.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Parse a successful `/chat/completions` body.
pub fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

    let text = choice.message.content.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ProviderError::InvalidResponse(
            "Empty completion content".into(),
        ));
    }

    Ok(Completion {
        text,
        model: response.model,
        usage: response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    })
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(provider = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .authorize(self.client.post(&url))
            .timeout(request.deadline)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(provider = %self.name, status, body = %text, "Provider returned error");
            return Err(error_for_status(status, &text, retry_after));
        }

        parse_completion(&text)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// Stand-in for a provider whose API key is not configured.
pub struct MissingKeyProvider {
    inner: OpenAiCompatProvider,
    key_env: String,
}

impl MissingKeyProvider {
    fn error(&self) -> ProviderError {
        ProviderError::NotConfigured(format!(
            "{}: API key not set (expected in {})",
            self.inner.name, self.key_env
        ))
    }
}

#[async_trait]
impl Provider for MissingKeyProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, ProviderError> {
        Err(self.error())
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Err(self.error())
    }
}

// --- OpenAI API types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}
