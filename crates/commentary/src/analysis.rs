//! Analysis kinds — what a report section asks the service to comment on.
//!
//! Each kind carries the keyword set used to pull domain context and the
//! instruction block appended to the prompt. The keyword sets mix English
//! and Italian terms because the reference context documents are Italian.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Overview of a dataset: volume, coverage, validation.
    DataSummary,
    /// False positives and false negatives by method.
    ErrorPatterns,
    /// Commentary for one chart.
    ChartCommentary,
    /// Free-form section text.
    General,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        Self::DataSummary,
        Self::ErrorPatterns,
        Self::ChartCommentary,
        Self::General,
    ];

    /// Default context keywords.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::DataSummary => &[
                "dizionario",
                "dati",
                "campo",
                "colonna",
                "dataset",
                "field",
                "terminologia",
                "sistema",
            ],
            Self::ErrorPatterns => &[
                "errore",
                "error",
                "pattern",
                "validazione",
                "confronto",
                "fp",
                "fn",
                "tp",
                "tn",
                "comparison",
            ],
            Self::ChartCommentary => &[
                "metodo",
                "performance",
                "metriche",
                "precision",
                "recall",
                "accuracy",
                "f1",
                "grafico",
            ],
            Self::General => &[],
        }
    }

    /// Context query for this kind, optionally narrowed to one field.
    pub fn query(&self, field: Option<&str>) -> Vec<String> {
        let mut query: Vec<String> = self.keywords().iter().map(|k| k.to_string()).collect();
        if let Some(field) = field.map(str::trim).filter(|f| !f.is_empty()) {
            query.push(field.to_lowercase());
            query.push("campo".into());
            query.push("field".into());
        }
        query
    }

    /// What the generated text must cover and how it should be formatted.
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::DataSummary => {
                "Provide a structured analysis that highlights:\n\
                 1. Data volume and coverage (validated versus total records)\n\
                 2. Overall performance of the recognition methods\n\
                 3. Relevant observations about the validation process"
            }
            Self::ErrorPatterns => {
                "Provide a structured analysis that:\n\
                 1. Identifies which methods have the most problems (FP or FN)\n\
                 2. Examines whether confidence correlates with errors\n\
                 3. Suggests possible improvements or areas needing attention"
            }
            Self::ChartCommentary => {
                "The commentary must:\n\
                 1. Open with 1-2 paragraphs describing the main patterns observed\n\
                 2. Include a \"Points of interest / anomalies\" section with a bullet list when applicable\n\
                 3. Include an \"Operational recommendations\" section with a bullet list when applicable"
            }
            Self::General => "Write a concise, factual paragraph on the topic above.",
        }
    }

    /// Formatting rules shared by every kind.
    pub fn formatting() -> &'static str {
        "Formatting:\n\
         - Use *italics* for method names, technical terms and system names\n\
         - Use bullet lists to organise multiple points\n\
         - Keep paragraphs short and readable\n\
         - Use **bold** sparingly for key concepts\n\
         Use markdown for all formatting."
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataSummary => write!(f, "data_summary"),
            Self::ErrorPatterns => write!(f, "error_patterns"),
            Self::ChartCommentary => write!(f, "chart_commentary"),
            Self::General => write!(f, "general"),
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown analysis kind '{s}' (expected one of: data_summary, error_patterns, chart_commentary, general)"
                )
            })
    }
}
