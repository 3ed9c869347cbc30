//! Auxiliary domain context for glossa requests.
//!
//! A [`ContextStore`] is built once from a directory of documents and is
//! read-only afterwards, so it can be shared behind an `Arc` and queried by
//! any number of concurrent requests. The [`ContextRelevanceSelector`] picks
//! the sections that best match a keyword query and renders them under a
//! character budget.
//!
//! # Determinism
//!
//! Selection is deterministic: identical store, query and budget always
//! produce identical text. No random or time-dependent logic is used.

pub mod document;
pub mod keywords;
pub mod selector;
pub mod store;

pub use document::{ContextDocument, ContextSection};
pub use keywords::{normalize_query, tokenize};
pub use selector::{ContextRelevanceSelector, ScoredSection, Selection};
pub use store::{ContextStore, LoadOptions, LoadWarning};
