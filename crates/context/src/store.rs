//! ContextStore — the immutable collection of parsed context sections.

use crate::document::{ContextDocument, ContextSection, split_into_sections};
use glossa_core::error::ContextError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "pdf"];

/// Options controlling how documents become sections.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Sections with a shorter body are dropped.
    pub min_section_chars: usize,
    /// Fail with `NoContextAvailable` instead of returning an empty store.
    pub mandatory: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            min_section_chars: 100,
            mandatory: false,
        }
    }
}

/// A document that was skipped during loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    pub document: String,
    pub error: ContextError,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.document, self.error)
    }
}

/// Ordered, read-only collection of context sections.
///
/// Sections are stored in document order, then heading order. Nothing
/// mutates a store after construction, so it is shared as
/// `Arc<ContextStore>` without locking.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    sections: Vec<ContextSection>,
    documents: Vec<String>,
    warnings: Vec<LoadWarning>,
}

impl ContextStore {
    /// A store with no sections. Every selection against it is empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every supported document in `dir`, in file-name order.
    ///
    /// A missing directory counts as zero documents. Any other failure to
    /// list the directory is an `Io` error.
    pub fn load(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, ContextError> {
        let dir = dir.as_ref();
        let candidates = match list_documents(dir) {
            Ok(paths) => paths,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "Context directory not found");
                Vec::new()
            }
            Err(e) => {
                return Err(ContextError::Io {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let raw: Vec<Result<ContextDocument, LoadWarning>> = candidates
            .into_iter()
            .map(|path| {
                let name = file_name(&path);
                read_document(&path)
                    .map(|text| ContextDocument::new(name.clone(), text))
                    .map_err(|reason| LoadWarning {
                        document: name.clone(),
                        error: ContextError::Parse {
                            document: name,
                            reason,
                        },
                    })
            })
            .collect();

        Self::assemble(raw, options, dir)
    }

    /// Build a store from in-memory documents, applying the same rules as
    /// [`load`](Self::load). Documents keep the order given.
    pub fn from_documents(
        documents: Vec<ContextDocument>,
        options: &LoadOptions,
    ) -> Result<Self, ContextError> {
        let raw: Vec<Result<ContextDocument, LoadWarning>> =
            documents.into_iter().map(Ok).collect();
        Self::assemble(raw, options, Path::new("<memory>"))
    }

    fn assemble(
        raw: Vec<Result<ContextDocument, LoadWarning>>,
        options: &LoadOptions,
        origin: &Path,
    ) -> Result<Self, ContextError> {
        let mut store = Self::empty();

        for entry in raw {
            let document = match entry {
                Ok(document) => document,
                Err(warning) => {
                    store.skip(warning);
                    continue;
                }
            };

            let document_index = store.documents.len();
            let sections = split_into_sections(
                &document.id,
                document_index,
                &document.text,
                options.min_section_chars,
            );
            if sections.is_empty() {
                store.skip(LoadWarning {
                    document: document.id.clone(),
                    error: ContextError::Parse {
                        document: document.id,
                        reason: format!(
                            "no section of at least {} characters",
                            options.min_section_chars
                        ),
                    },
                });
                continue;
            }

            debug!(document = %document.id, sections = sections.len(), "Parsed context document");
            store.documents.push(document.id);
            store.sections.extend(sections);
        }

        if store.documents.is_empty() && options.mandatory {
            return Err(ContextError::NoContextAvailable {
                dir: origin.to_path_buf(),
            });
        }

        info!(
            documents = store.documents.len(),
            sections = store.sections.len(),
            skipped = store.warnings.len(),
            "Context store ready"
        );
        Ok(store)
    }

    fn skip(&mut self, warning: LoadWarning) {
        warn!(document = %warning.document, error = %warning.error, "Skipping context document");
        self.warnings.push(warning);
    }

    /// All sections in document order, then heading order.
    pub fn sections(&self) -> &[ContextSection] {
        &self.sections
    }

    /// Identifiers of the documents that contributed sections.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Documents skipped during loading.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// The text of one document. PDF pages are extracted and labelled in page
/// order; pages without text are left out.
fn read_document(path: &Path) -> Result<String, String> {
    if !is_pdf(path) {
        return std::fs::read_to_string(path).map_err(|e| e.to_string());
    }

    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    // pdf-extract panics on some malformed files instead of returning Err.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .map_err(|_| "PDF text extraction aborted on malformed input".to_string())?
        .map_err(|e| format!("PDF text extraction failed: {e}"))?;

    let text = pages
        .iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(index, page)| format!("--- Page {} ---\n{}", index + 1, page.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");
    debug!(file = %file_name(path), pages = pages.len(), "Extracted PDF text");
    Ok(text)
}

/// Supported files directly under `dir`, sorted by file name.
fn list_documents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = file_name(&path);
        if name.starts_with('.') || name.eq_ignore_ascii_case("README.md") {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            });
        if !supported {
            debug!(file = %name, "Unsupported context file type, skipping");
            continue;
        }
        paths.push(path);
    }
    paths.sort_by_key(|p| file_name(p));
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn body(word: &str) -> String {
        format!("{word} ").repeat(40)
    }

    #[test]
    fn load_orders_documents_by_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b_metrics.md"), format!("# Recall\n{}", body("recall"))).unwrap();
        fs::write(tmp.path().join("a_glossary.txt"), format!("# Precision\n{}", body("precision"))).unwrap();

        let store = ContextStore::load(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(store.documents(), ["a_glossary.txt", "b_metrics.md"]);
        assert_eq!(store.sections()[0].heading, "Precision");
        assert_eq!(store.sections()[1].document_index, 1);
        assert!(store.warnings().is_empty());
    }

    #[test]
    fn load_skips_hidden_readme_and_unsupported_files() {
        let tmp = tempfile::tempdir().unwrap();
        let text = format!("# Topic\n{}", body("topic"));
        fs::write(tmp.path().join(".hidden.md"), &text).unwrap();
        fs::write(tmp.path().join("README.md"), &text).unwrap();
        fs::write(tmp.path().join("manual.docx"), &text).unwrap();
        fs::write(tmp.path().join("notes.md"), &text).unwrap();

        let store = ContextStore::load(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(store.documents(), ["notes.md"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn document_without_sections_becomes_warning() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("empty.md"), "# Short\ntoo short").unwrap();
        fs::write(tmp.path().join("good.md"), format!("# Good\n{}", body("good"))).unwrap();

        let store = ContextStore::load(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(store.documents(), ["good.md"]);
        assert_eq!(store.warnings().len(), 1);
        assert_eq!(store.warnings()[0].document, "empty.md");
        assert!(matches!(store.warnings()[0].error, ContextError::Parse { .. }));
        // Document order counts only documents that contributed.
        assert_eq!(store.sections()[0].document_index, 0);
    }

    #[test]
    fn unreadable_document_becomes_warning() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("latin1.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let store = ContextStore::load(tmp.path(), &LoadOptions::default()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.warnings().len(), 1);
        assert!(store.warnings()[0].to_string().starts_with("latin1.txt:"));
    }

    #[test]
    fn unreadable_pdf_becomes_parse_warning() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("broken.pdf"), b"%PDF-1.4\nnot really a pdf").unwrap();
        fs::write(tmp.path().join("notes.md"), format!("# Notes\n{}", body("notes"))).unwrap();

        let store = ContextStore::load(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(store.documents(), ["notes.md"]);
        assert_eq!(store.warnings().len(), 1);
        assert_eq!(store.warnings()[0].document, "broken.pdf");
        assert!(matches!(
            &store.warnings()[0].error,
            ContextError::Parse { document, .. } if document == "broken.pdf"
        ));
    }

    #[test]
    fn pdf_extension_is_recognised_case_insensitively() {
        assert!(is_pdf(Path::new("Manual.PDF")));
        assert!(!is_pdf(Path::new("manual.md")));
    }

    #[test]
    fn missing_directory_depends_on_mandatory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        let store = ContextStore::load(&missing, &LoadOptions::default()).unwrap();
        assert!(store.is_empty());

        let options = LoadOptions {
            mandatory: true,
            ..LoadOptions::default()
        };
        let err = ContextStore::load(&missing, &options).unwrap_err();
        assert!(matches!(err, ContextError::NoContextAvailable { dir } if dir == missing));
    }

    #[test]
    fn from_documents_applies_same_rules() {
        let docs = vec![
            ContextDocument::new("short", "# A\nx"),
            ContextDocument::new("long", format!("# B\n{}", body("beta"))),
        ];
        let store = ContextStore::from_documents(docs, &LoadOptions::default()).unwrap();
        assert_eq!(store.documents(), ["long"]);
        assert_eq!(store.warnings().len(), 1);

        let options = LoadOptions {
            mandatory: true,
            ..LoadOptions::default()
        };
        assert!(ContextStore::from_documents(Vec::new(), &options).is_err());
    }

    #[test]
    fn store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContextStore>();
    }
}
