//! Document loading and chunking.
//!
//! Walks the documents directory recursively. Plain text and markdown are
//! read as-is, PDFs go through text extraction, everything else is
//! skipped. Hidden entries (dot-prefixed) are ignored, and files that
//! cannot be read are logged and skipped rather than failing the whole
//! build.

use std::fs;
use std::path::Path;

use text_splitter::TextSplitter;
use tracing::{debug, warn};

use crate::errors::AppError;

/// A document read from disk, before chunking.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Path relative to the documents directory, kept for retrieval
    /// provenance.
    pub source: String,
    pub text: String,
}

pub fn load_documents(dir: &Path) -> Result<Vec<LoadedDocument>, AppError> {
    let mut paths = Vec::new();
    collect_files(dir, &mut paths)?;
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let source = path
            .strip_prefix(dir)
            .map(|rel| rel.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path.display().to_string());

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let text = match extension.as_str() {
            "txt" | "md" => match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {e}", path.display());
                    continue;
                }
            },
            "pdf" => match pdf_extract::extract_text(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping PDF with no extractable text {}: {e}", path.display());
                    continue;
                }
            },
            _ => {
                debug!("Skipping unsupported file type {}", path.display());
                continue;
            }
        };

        if text.trim().is_empty() {
            warn!("Skipping empty document {}", path.display());
            continue;
        }

        documents.push(LoadedDocument { source, text });
    }

    if documents.is_empty() {
        return Err(AppError::Index(format!(
            "No readable documents found in {}",
            dir.display()
        )));
    }

    Ok(documents)
}

/// Collect file paths under `dir`, depth-first. Entries whose name starts
/// with a dot are ignored at every level.
fn collect_files(dir: &Path, paths: &mut Vec<std::path::PathBuf>) -> Result<(), AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::Index(format!(
            "Cannot read documents directory {}: {e}",
            dir.display()
        ))
    })?;

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let hidden = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(false);
        if hidden {
            debug!("Skipping hidden entry {}", path.display());
            continue;
        }
        if path.is_dir() {
            collect_files(&path, paths)?;
        } else {
            paths.push(path);
        }
    }
    Ok(())
}

/// Split text into chunks of at most `max_chars` characters, on natural
/// boundaries where possible.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    TextSplitter::new(max_chars)
        .chunks(text)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_load_documents_reads_text_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        write!(File::create(dir.path().join("b.md")).unwrap(), "markdown notes").unwrap();
        write!(File::create(dir.path().join("a.txt")).unwrap(), "resume text").unwrap();
        File::create(dir.path().join("c.bin")).unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "a.txt");
        assert_eq!(docs[0].text, "resume text");
        assert_eq!(docs[1].source, "b.md");
        assert_eq!(docs[1].text, "markdown notes");
    }

    #[test]
    fn test_load_documents_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_documents(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No readable documents"));
    }

    #[test]
    fn test_load_documents_skips_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        write!(File::create(dir.path().join("real.txt")).unwrap(), "content").unwrap();
        write!(File::create(dir.path().join("blank.txt")).unwrap(), "   \n").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "real.txt");
    }

    #[test]
    fn test_load_documents_recurses_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        write!(File::create(dir.path().join("top.txt")).unwrap(), "top level").unwrap();
        std::fs::create_dir(dir.path().join("projects")).unwrap();
        write!(
            File::create(dir.path().join("projects").join("nested.txt")).unwrap(),
            "nested notes"
        )
        .unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "projects/nested.txt");
        assert_eq!(docs[0].text, "nested notes");
        assert_eq!(docs[1].source, "top.txt");
    }

    #[test]
    fn test_load_documents_ignores_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        write!(File::create(dir.path().join("real.txt")).unwrap(), "content").unwrap();
        write!(File::create(dir.path().join(".draft.txt")).unwrap(), "hidden").unwrap();
        std::fs::create_dir(dir.path().join(".cache")).unwrap();
        write!(
            File::create(dir.path().join(".cache").join("stale.txt")).unwrap(),
            "stale"
        )
        .unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "real.txt");
    }

    #[test]
    fn test_chunk_text_respects_max_size() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(60);
        let chunks = chunk_text(&text, 1000);
        assert!(chunks.len() >= 3, "expected several chunks, got {}", chunks.len());
        assert!(chunks.iter().all(|c| c.len() <= 1000));
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn test_chunk_text_short_text_is_one_chunk() {
        let chunks = chunk_text("short note", 1000);
        assert_eq!(chunks, vec!["short note".to_string()]);
    }
}
