//! Corpus loading.
//!
//! Reads plain-text documents from a flat corpus directory. Every file
//! produces an explicit [`LoadOutcome`]; unreadable or unsupported files
//! are skipped with a logged reason and never abort the load.

use crate::types::Document;
use docqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions this loader understands. Anything else (PDF, DOCX, ...) is
/// reported as skipped; binary-format extraction is a separate concern.
const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Result of attempting to load one file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The file produced a document
    Loaded(Document),

    /// The file was skipped, with the reason why
    Skipped { path: PathBuf, reason: String },
}

/// Whether a path has a supported text extension.
fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Attempt to load a single file as a document.
pub fn read_document(path: &Path) -> LoadOutcome {
    if !is_supported(path) {
        return LoadOutcome::Skipped {
            path: path.to_path_buf(),
            reason: "unsupported format".to_string(),
        };
    }

    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            return LoadOutcome::Skipped {
                path: path.to_path_buf(),
                reason: "filename is not valid UTF-8".to_string(),
            }
        }
    };

    match std::fs::read_to_string(path) {
        Ok(text) => LoadOutcome::Loaded(Document {
            id: filename.clone(),
            text,
            source: filename,
        }),
        Err(e) => LoadOutcome::Skipped {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    }
}

/// Load all documents from the corpus directory.
///
/// Non-recursive: only direct children are considered, sorted by filename
/// for deterministic ordering. Skips fold into log lines, not errors.
pub fn load_documents(directory: &Path) -> AppResult<Vec<Document>> {
    if !directory.is_dir() {
        return Err(AppError::Ingestion(format!(
            "Corpus directory does not exist: {:?}",
            directory
        )));
    }

    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        match read_document(entry.path()) {
            LoadOutcome::Loaded(document) => {
                tracing::debug!("Loaded document: {}", document.id);
                documents.push(document);
            }
            LoadOutcome::Skipped { path, reason } => {
                tracing::warn!("Skipping {:?}: {}", path, reason);
                skipped += 1;
            }
        }
    }

    tracing::info!(
        "Loaded {} documents from {:?} ({} skipped)",
        documents.len(),
        directory,
        skipped
    );

    Ok(documents)
}
