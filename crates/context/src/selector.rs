//! ContextRelevanceSelector — keyword scoring and budgeted selection.
//!
//! Sections are scored by how many query keywords they contain, ranked
//! (score descending, then document order, then heading order) and packed
//! greedily under a character budget. A section that does not fit is
//! skipped whole; later, smaller sections may still fit. Nothing is ever
//! truncated.

use crate::document::ContextSection;
use crate::keywords::normalize_query;
use crate::store::ContextStore;
use std::sync::Arc;
use tracing::debug;

const SEPARATOR: &str = "\n\n";
const SEPARATOR_CHARS: usize = 2;

/// A section together with its relevance score for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredSection<'a> {
    pub section: &'a ContextSection,
    pub score: usize,
}

/// The outcome of one budgeted selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Rendered sections joined by a blank line. Never longer than the
    /// budget, in chars.
    pub text: String,
    /// `(document_id, heading)` of every included section, in output order.
    pub included: Vec<(String, String)>,
    /// Eligible sections left out because they did not fit.
    pub skipped: usize,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Picks the context sections relevant to a request.
///
/// Holds only a shared handle on the immutable store, so one selector can
/// serve any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct ContextRelevanceSelector {
    store: Arc<ContextStore>,
}

impl ContextRelevanceSelector {
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Sections with a positive score, best first.
    pub fn rank<S: AsRef<str>>(&self, query: &[S]) -> Vec<ScoredSection<'_>> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<ScoredSection<'_>> = self
            .store
            .sections()
            .iter()
            .filter_map(|section| {
                let score = section.keywords.intersection(&query).count();
                (score > 0).then_some(ScoredSection { section, score })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.section.document_index.cmp(&b.section.document_index))
                .then(a.section.section_index.cmp(&b.section.section_index))
        });
        ranked
    }

    /// The relevant context text for `query`, at most `budget` chars long.
    ///
    /// Returns an empty string when the budget is zero or nothing matches.
    pub fn select<S: AsRef<str>>(&self, query: &[S], budget: usize) -> String {
        self.select_detailed(query, budget).text
    }

    /// Like [`select`](Self::select), also reporting what was included and
    /// how many eligible sections were skipped for budget.
    pub fn select_detailed<S: AsRef<str>>(&self, query: &[S], budget: usize) -> Selection {
        if budget == 0 {
            return Selection::default();
        }

        let mut selection = Selection::default();
        let mut used = 0usize;

        for scored in self.rank(query) {
            let separator = if selection.included.is_empty() {
                0
            } else {
                SEPARATOR_CHARS
            };
            let needed = separator + scored.section.rendered_len();
            if used + needed > budget {
                selection.skipped += 1;
                continue;
            }

            if separator > 0 {
                selection.text.push_str(SEPARATOR);
            }
            selection.text.push_str(&scored.section.render());
            selection.included.push((
                scored.section.document_id.clone(),
                scored.section.heading.clone(),
            ));
            used += needed;
        }

        debug!(
            budget,
            chars = used,
            sections = selection.included.len(),
            skipped = selection.skipped,
            "Context selected"
        );
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContextDocument;
    use crate::store::LoadOptions;

    fn options() -> LoadOptions {
        LoadOptions {
            min_section_chars: 1,
            mandatory: false,
        }
    }

    fn selector(docs: Vec<ContextDocument>) -> ContextRelevanceSelector {
        let store = ContextStore::from_documents(docs, &options()).unwrap();
        ContextRelevanceSelector::new(Arc::new(store))
    }

    fn metrics_selector() -> ContextRelevanceSelector {
        selector(vec![
            ContextDocument::new(
                "a.md",
                "# Precision\nPrecision counts correct positive predictions.\n\
                 # Recall\nRecall measures found positives among actual positives.\n\
                 # Charts\nBar charts compare categories.",
            ),
            ContextDocument::new(
                "b.md",
                "# Errors\nFalse positive and false negative errors, precision recall tradeoff.",
            ),
        ])
    }

    #[test]
    fn ranks_by_overlap_then_document_order() {
        let sel = metrics_selector();
        let ranked = sel.rank(&["precision", "recall"]);
        let headings: Vec<&str> = ranked.iter().map(|s| s.section.heading.as_str()).collect();
        // "Errors" matches both keywords; the others match one each.
        assert_eq!(headings, vec!["Errors", "Precision", "Recall"]);
        assert_eq!(ranked[0].score, 2);
        assert_eq!(ranked[1].score, 1);
    }

    #[test]
    fn equal_scores_keep_document_then_heading_order() {
        let sel = selector(vec![
            ContextDocument::new("z.md", "# Second\nshared keyword here"),
            ContextDocument::new("a.md", "# First\nshared keyword too\n# Third\nshared again"),
        ]);
        let ranked = sel.rank(&["shared"]);
        let order: Vec<(&str, usize)> = ranked
            .iter()
            .map(|s| (s.section.document_id.as_str(), s.section.section_index))
            .collect();
        // Document order is insertion order for in-memory documents.
        assert_eq!(order, vec![("z.md", 0), ("a.md", 0), ("a.md", 1)]);
    }

    #[test]
    fn selection_is_deterministic() {
        let sel = metrics_selector();
        let first = sel.select(&["precision", "charts"], 500);
        for _ in 0..10 {
            assert_eq!(sel.select(&["precision", "charts"], 500), first);
        }
        assert!(first.starts_with("## Precision\n"));
    }

    #[test]
    fn zero_budget_or_no_match_is_empty() {
        let sel = metrics_selector();
        assert_eq!(sel.select(&["precision"], 0), "");
        assert_eq!(sel.select(&["unrelated"], 1000), "");
        let empty: [&str; 0] = [];
        assert_eq!(sel.select(&empty, 1000), "");
        assert_eq!(sel.select(&["  ", ""], 1000), "");
    }

    #[test]
    fn empty_store_selects_nothing() {
        let sel = ContextRelevanceSelector::new(Arc::new(ContextStore::empty()));
        assert!(sel.select_detailed(&["precision"], 1000).is_empty());
    }

    #[test]
    fn output_respects_budget_and_never_truncates() {
        let sel = metrics_selector();
        let all = sel.rank(&["precision", "recall", "charts"]);
        let rendered: Vec<String> = all.iter().map(|s| s.section.render()).collect();

        for budget in 1..400 {
            let selection = sel.select_detailed(&["precision", "recall", "charts"], budget);
            assert!(selection.text.chars().count() <= budget);
            if !selection.text.is_empty() {
                for piece in selection.text.split(SEPARATOR) {
                    assert!(rendered.iter().any(|r| r == piece), "truncated piece {piece:?}");
                }
            }
            assert_eq!(selection.included.len() + selection.skipped, all.len());
        }
    }

    #[test]
    fn oversized_section_is_skipped_and_filling_continues() {
        let long_body = "precision ".repeat(50);
        let sel = selector(vec![ContextDocument::new(
            "a.md",
            format!("# Big\n{long_body}\n# Small\nprecision in short"),
        )]);

        let selection = sel.select_detailed(&["precision"], 60);
        assert_eq!(selection.text, "## Small\nprecision in short");
        assert_eq!(selection.skipped, 1);
        assert_eq!(
            selection.included,
            vec![("a.md".to_string(), "Small".to_string())]
        );
    }

    #[test]
    fn separator_counts_against_budget() {
        let sel = selector(vec![ContextDocument::new(
            "a.md",
            "# One\nalpha\n# Two\nalpha",
        )]);
        // "## One\nalpha" and "## Two\nalpha" are 12 chars each.
        assert_eq!(sel.select(&["alpha"], 25), "## One\nalpha");
        assert_eq!(sel.select(&["alpha"], 26), "## One\nalpha\n\n## Two\nalpha");
    }

    #[test]
    fn hyphenated_headings_match_their_parts() {
        let sel = selector(vec![ContextDocument::new(
            "metrics.md",
            "# F1-score
Harmonic mean of precision-like and recall-like measures.
             # False-positive rate
Share of negatives wrongly flagged.
             # Coverage
Validated records over total records.",
        )]);

        let f1 = sel.select(&["f1"], 1000);
        assert!(f1.starts_with("## F1-score\n"));
        assert!(!f1.contains("False-positive"));

        let fp = sel.select(&["false", "positive"], 1000);
        assert!(fp.starts_with("## False-positive rate\n"));
        assert!(!fp.contains("F1-score"));

        // The compound itself still matches.
        assert!(sel.select(&["f1-score"], 1000).starts_with("## F1-score\n"));
    }
}
