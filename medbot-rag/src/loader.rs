//! PDF corpus discovery and text extraction.
//!
//! [`load_pdf_directory`] walks a directory tree, extracts the text of every
//! `.pdf` file page by page, and returns one [`Document`] per non-blank page.
//! Extraction goes through `pdf-extract` on tokio's blocking pool; a file that
//! cannot be parsed is skipped and reported in [`LoadReport::failures`]
//! rather than aborting the whole load.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// A file that was discovered but could not be turned into documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// The outcome of loading a directory of PDFs.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// One document per non-blank page, in path order then page order.
    pub documents: Vec<Document>,
    /// Files that were skipped because extraction failed.
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Number of distinct source files that produced at least one document.
    pub fn source_count(&self) -> usize {
        let mut sources: Vec<&str> = self.documents.iter().map(|d| d.source.as_str()).collect();
        sources.dedup();
        sources.len()
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Recursively list every `.pdf` file (case-insensitive) under `root`, sorted by path.
///
/// # Errors
///
/// Returns [`RagError::Load`] if `root` does not exist or is not a directory.
pub fn discover_pdf_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(RagError::load(root.display().to_string(), "not a readable directory"));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Turn the extracted pages of one file into documents.
///
/// Pages are numbered from 1. Pages with no visible text are dropped.
pub fn pages_to_documents(source: &str, pages: Vec<String>) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Document::new(source, text).with_page(i as u32 + 1))
        .collect()
}

/// Extract one PDF file synchronously.
///
/// `pdf-extract` can panic on malformed input, so the call is isolated with
/// `catch_unwind` and a panic is reported like any other parse failure.
pub fn load_pdf_file(path: &Path) -> Result<Vec<Document>> {
    let source = path.display().to_string();
    let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }));

    let pages = match extracted {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(RagError::load(source, e.to_string())),
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "pdf parser panicked".to_string()
            };
            return Err(RagError::load(source, message));
        }
    };

    let page_count = pages.len();
    let documents = pages_to_documents(&source, pages);
    debug!(path = %source, page_count, documents = documents.len(), "extracted pdf");
    Ok(documents)
}

/// Load every PDF under `root`.
///
/// An empty directory yields an empty report. Individual files that fail to
/// parse are logged and recorded; the call only fails when the directory is
/// unusable or every discovered file failed.
///
/// # Errors
///
/// Returns [`RagError::Load`] for a missing root or when no file could be read.
pub async fn load_pdf_directory(root: &Path) -> Result<LoadReport> {
    let files = discover_pdf_files(root)?;
    info!(root = %root.display(), file_count = files.len(), "loading pdf corpus");

    let mut report = LoadReport::default();
    for path in &files {
        let owned = path.clone();
        let outcome = tokio::task::spawn_blocking(move || load_pdf_file(&owned))
            .await
            .map_err(|e| {
                RagError::load(path.display().to_string(), format!("extraction task failed: {e}"))
            })
            .and_then(|r| r);

        match outcome {
            Ok(documents) => report.documents.extend(documents),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable pdf");
                report.failures.push(LoadFailure { path: path.clone(), message: e.to_string() });
            }
        }
    }

    if !files.is_empty() && report.failures.len() == files.len() {
        return Err(RagError::load(
            root.display().to_string(),
            format!("none of the {} pdf files could be read", files.len()),
        ));
    }

    info!(
        documents = report.documents.len(),
        failures = report.failures.len(),
        "pdf corpus loaded"
    );
    Ok(report)
}
