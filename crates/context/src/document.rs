//! Context documents and their split into titled sections.

use crate::keywords::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Title given to text that appears before the first heading.
pub const INTRODUCTION_HEADING: &str = "Introduction";

/// A raw auxiliary document, before splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDocument {
    /// Stable identifier (the file name for documents loaded from disk).
    pub id: String,
    pub text: String,
}

impl ContextDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A titled slice of a context document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSection {
    pub document_id: String,
    /// Position of the owning document in document order.
    pub document_index: usize,
    /// Position of this section within its document.
    pub section_index: usize,
    pub heading: String,
    pub body: String,
    /// Normalised keywords of heading and body.
    pub keywords: BTreeSet<String>,
}

impl ContextSection {
    /// The text this section contributes to a prompt.
    pub fn render(&self) -> String {
        format!("## {}\n{}", self.heading, self.body)
    }

    /// Length of [`render`](Self::render) in chars.
    pub fn rendered_len(&self) -> usize {
        // "## " + heading + "\n" + body
        3 + self.heading.chars().count() + 1 + self.body.chars().count()
    }
}

/// Recognise a structural heading, returning its title.
///
/// Markdown ATX headings (`#` to `######` followed by whitespace) and lines
/// made only of ASCII capitals and spaces, at least four long, count.
fn heading_title(line: &str) -> Option<&str> {
    let line = line.trim();

    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
            return Some(strip_closing_hashes(rest.trim()));
        }
        return None;
    }

    let all_caps = line.chars().count() >= 4
        && line.starts_with(|c: char| c.is_ascii_uppercase())
        && line
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_whitespace());
    all_caps.then_some(line)
}

/// Drop an ATX closing sequence: a run of `#` preceded by whitespace.
fn strip_closing_hashes(title: &str) -> &str {
    let stripped = title.trim_end_matches('#');
    if stripped.len() < title.len() && stripped.ends_with(char::is_whitespace) {
        stripped.trim_end()
    } else {
        title
    }
}

/// Split a document into sections, dropping those whose body is shorter
/// than `min_section_chars`.
pub fn split_into_sections(
    document_id: &str,
    document_index: usize,
    text: &str,
    min_section_chars: usize,
) -> Vec<ContextSection> {
    let mut sections = Vec::new();
    let mut heading = INTRODUCTION_HEADING.to_string();
    let mut lines: Vec<&str> = Vec::new();

    let flush = |heading: &str, lines: &[&str], sections: &mut Vec<ContextSection>| {
        let body = lines.join("\n").trim().to_string();
        if body.is_empty() || body.chars().count() < min_section_chars {
            return;
        }
        let keywords = tokenize(&format!("{heading} {body}"));
        sections.push(ContextSection {
            document_id: document_id.to_string(),
            document_index,
            section_index: sections.len(),
            heading: heading.to_string(),
            body,
            keywords,
        });
    };

    for line in text.lines() {
        match heading_title(line) {
            Some(title) => {
                flush(&heading, &lines, &mut sections);
                heading = title.to_string();
                lines.clear();
            }
            None => lines.push(line),
        }
    }
    flush(&heading, &lines, &mut sections);

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(word: &str) -> String {
        format!("{word} ").repeat(30)
    }

    #[test]
    fn atx_and_caps_headings_split() {
        let text = format!(
            "# Precision\n{}\nDATA QUALITY\n{}\n### Recall ###\n{}",
            filler("precision"),
            filler("quality"),
            filler("recall")
        );
        let sections = split_into_sections("doc.md", 0, &text, 100);
        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Precision", "DATA QUALITY", "Recall"]);
        assert_eq!(sections[2].section_index, 2);
        assert!(sections[1].keywords.contains("quality"));
        assert!(sections[1].keywords.contains("data"));
    }

    #[test]
    fn leading_text_becomes_introduction() {
        let text = format!("{}\n## Next\n{}", filler("intro"), filler("next"));
        let sections = split_into_sections("doc.md", 3, &text, 10);
        assert_eq!(sections[0].heading, INTRODUCTION_HEADING);
        assert_eq!(sections[0].document_index, 3);
        assert_eq!(sections[1].heading, "Next");
    }

    #[test]
    fn short_sections_dropped_and_indices_stay_dense() {
        let text = format!("# Tiny\nshort\n# Long\n{}", filler("long"));
        let sections = split_into_sections("doc.md", 0, &text, 100);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Long");
        assert_eq!(sections[0].section_index, 0);
    }

    #[test]
    fn non_headings_are_body_text() {
        assert_eq!(heading_title("#hashtag"), None);
        assert_eq!(heading_title("ABC"), None);
        assert_eq!(heading_title("F1 SCORE"), None);
        assert_eq!(heading_title("Mixed Case Line"), None);
        assert_eq!(heading_title("####### seven"), None);
        assert_eq!(heading_title("  ## Indented  "), Some("Indented"));
        assert_eq!(heading_title("SUMMARY"), Some("SUMMARY"));
    }

    #[test]
    fn closing_hashes_need_leading_space() {
        assert_eq!(heading_title("## Methods ##"), Some("Methods"));
        assert_eq!(heading_title("# C#"), Some("C#"));
        assert_eq!(heading_title("# F# and C# ###"), Some("F# and C#"));
    }

    #[test]
    fn rendered_len_counts_chars() {
        let section = ContextSection {
            document_id: "d".into(),
            document_index: 0,
            section_index: 0,
            heading: "Qualità".into(),
            body: "è ok".into(),
            keywords: BTreeSet::new(),
        };
        assert_eq!(section.render(), "## Qualità\nè ok");
        assert_eq!(section.rendered_len(), section.render().chars().count());
    }
}
