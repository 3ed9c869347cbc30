//! Text-generation providers and the fallback chain for glossa.
//!
//! All providers implement the `glossa_core::Provider` trait. The
//! [`FallbackChain`] drives a request across them in priority order, and
//! [`router::build_chain`] assembles one from configuration.

pub mod fallback;
pub mod openai_compat;
pub mod router;

pub use fallback::{DEFAULT_ATTEMPT_TIMEOUT, FallbackChain, FallbackChainBuilder, next_state};
pub use openai_compat::{MissingKeyProvider, OpenAiCompatProvider};
pub use router::{build_chain, build_chain_with, build_provider};
