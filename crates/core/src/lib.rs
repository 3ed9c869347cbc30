//! # glossa core
//!
//! Domain types, traits, and error definitions for the glossa commentary
//! orchestrator. This crate has **no runtime dependencies**: it defines the
//! model every other crate builds against.
//!
//! ## Layout
//!
//! - [`candidate`]: the configured text-generation services and their order
//! - [`attempt`]: the tagged outcome of every invocation and of a whole request
//! - [`provider`]: the outbound `Provider` trait
//! - [`error`]: the error taxonomy shared by all crates

pub mod attempt;
pub mod candidate;
pub mod error;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use attempt::{ChainState, FailureKind, InvocationAttempt, InvocationResult, OutcomeKind};
pub use candidate::{ProviderFamily, ServiceCandidate};
pub use error::{Error, Result};
pub use provider::{Completion, CompletionRequest, Provider, Usage};
