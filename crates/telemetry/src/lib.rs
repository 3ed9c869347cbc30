//! Outcome tracking for glossa.
//!
//! Every attempt the fallback chain makes is appended to an
//! [`OutcomeTracker`]. Summaries are folded from the full log on demand and
//! answer the reporting questions: how often each candidate was tried, how
//! it failed, how fast it was, and which candidate served each request.

pub mod engine;
pub mod model;

pub use engine::OutcomeTracker;
pub use model::{CandidateSummary, RequestServed, UsageSummary};
