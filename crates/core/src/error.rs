//! Error types for the glossa domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use crate::attempt::FailureKind;
use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all glossa operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Context errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Fallback chain construction ---
    #[error("Fallback chain error: {0}")]
    Chain(#[from] ChainError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A failed call to a text-generation service.
///
/// Every variant maps onto exactly one [`FailureKind`] through
/// [`ProviderError::failure_kind`], which is all the fallback chain looks at.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Classify this error for the fallback policy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::ApiError { status_code, .. } => match status_code {
                429 => FailureKind::RateLimited,
                401 | 403 => FailureKind::AuthenticationError,
                402 => FailureKind::QuotaExceeded,
                408 | 504 => FailureKind::Timeout,
                500..=599 => FailureKind::NetworkError,
                _ => FailureKind::InvalidResponse,
            },
            Self::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            // A missing credential is a configuration defect, same as a rejected one.
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) => {
                FailureKind::AuthenticationError
            }
            Self::InvalidResponse(_) => FailureKind::InvalidResponse,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Network(_) => FailureKind::NetworkError,
        }
    }
}

/// Errors raised while loading auxiliary context documents.
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    #[error("Failed to parse context document {document}: {reason}")]
    Parse { document: String, reason: String },

    #[error("No context available in {dir}")]
    NoContextAvailable { dir: PathBuf },

    #[error("I/O error on {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// Errors raised while building a fallback chain.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("fallback chain has no candidates")]
    Empty,

    #[error("candidates '{first}' and '{second}' share priority {priority}")]
    DuplicatePriority {
        priority: u32,
        first: String,
        second: String,
    },

    #[error("candidate '{0}' is configured more than once")]
    DuplicateCandidate(String),
}
