//! Analytic commentary for glossa reports.
//!
//! [`CommentaryService`] is the single entry point report sections call:
//! it selects relevant domain context, assembles the prompt, drives the
//! fallback chain, and always hands back printable text, either the
//! generated commentary or a fixed notice.

pub mod analysis;
pub mod prompt;
pub mod service;

pub use analysis::AnalysisKind;
pub use prompt::build_prompt;
pub use service::{CANCELLED_NOTICE, CommentaryService, DISABLED_NOTICE, FALLBACK_NOTICE};
