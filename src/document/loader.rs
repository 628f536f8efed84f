//! Document loaders
//!
//! Loaders turn a file on disk into a `Document`. Plain text is read
//! directly; PDFs are extracted with the `pdftotext` system binary. Both
//! formats separate pages with a form feed.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::document::{Document, Page};
use crate::errors::{RagError, Result};

/// Page separator emitted by `pdftotext` and honored in text files
const PAGE_BREAK: char = '\u{c}';

/// Produces a `Document` from a file path
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Document>;
}

/// Loads UTF-8 text files (`.txt`, `.md`)
#[derive(Debug, Clone, Default)]
pub struct TextLoader;

#[async_trait]
impl DocumentLoader for TextLoader {
    async fn load(&self, path: &Path) -> Result<Document> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RagError::Load(format!("{}: {}", path.display(), e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| RagError::Load(format!("{} is not valid UTF-8", path.display())))?;

        let document = split_pages(&path.display().to_string(), &text)?;
        debug!(pages = document.page_count(), "loaded text document");
        Ok(document)
    }
}

/// Loads PDFs through `pdftotext -layout -enc UTF-8`
#[derive(Debug, Clone)]
pub struct PdfLoader {
    binary: String,
}

impl PdfLoader {
    pub fn new() -> Self {
        Self {
            binary: "pdftotext".to_string(),
        }
    }

    /// Use a specific `pdftotext` executable
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Document> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(RagError::Load(format!("{}: no such file", path.display())));
        }

        info!("Extracting PDF text with {}", self.binary);
        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                RagError::Load(format!(
                    "failed to run {}: {} (is poppler installed?)",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("pdftotext failed: {}", stderr.trim());
            return Err(RagError::Load(format!(
                "{} could not read {}: {}",
                self.binary,
                path.display(),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        split_pages(&path.display().to_string(), &text)
    }
}

/// Picks a loader from the file extension
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    text: TextLoader,
    pdf: PdfLoader,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, path: &Path) -> Result<Document> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => self.pdf.load(path).await,
            Some("txt") | Some("md") | Some("text") => self.text.load(path).await,
            Some(other) => Err(RagError::Load(format!(
                "unsupported file format: .{}",
                other
            ))),
            None => Err(RagError::Load(format!(
                "cannot infer format of {} (no extension)",
                path.display()
            ))),
        }
    }
}

/// Split extracted text into pages on form feeds.
///
/// A trailing empty page (pdftotext ends every page with a form feed) is
/// dropped, whitespace-only pages keep their number but carry no text, and a
/// document without any text is rejected.
fn split_pages(source_path: &str, text: &str) -> Result<Document> {
    let mut raw: Vec<&str> = text.split(PAGE_BREAK).collect();
    while raw.len() > 1 && raw.last().is_some_and(|p| p.trim().is_empty()) {
        raw.pop();
    }

    let pages: Vec<Page> = raw
        .into_iter()
        .enumerate()
        .map(|(i, page)| Page {
            text: if page.trim().is_empty() {
                String::new()
            } else {
                page.to_string()
            },
            page_number: i + 1,
            source_path: source_path.to_string(),
        })
        .collect();

    if pages.iter().all(|p| p.text.is_empty()) {
        return Err(RagError::Load(format!(
            "no text could be extracted from {}",
            source_path
        )));
    }

    Ok(Document::new(pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_text_loader_single_page() {
        let file = temp_file(".txt", b"Patient has Type 2 diabetes.");
        let doc = TextLoader.load(file.path()).await.unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages()[0].text, "Patient has Type 2 diabetes.");
        assert_eq!(doc.pages()[0].page_number, 1);
    }

    #[tokio::test]
    async fn test_text_loader_form_feed_pages() {
        let file = temp_file(".txt", b"page one\x0cpage two\x0c");
        let doc = TextLoader.load(file.path()).await.unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].text, "page two");
        assert_eq!(doc.pages()[1].page_number, 2);
    }

    #[test]
    fn test_blank_pages_keep_numbering() {
        let doc = split_pages("a.txt", "one\x0c   \x0cthree").unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(doc.pages()[1].text.is_empty());
        assert_eq!(doc.pages()[2].page_number, 3);
    }

    #[tokio::test]
    async fn test_empty_file_is_load_error() {
        let file = temp_file(".txt", b"  \n ");
        let err = TextLoader.load(file.path()).await.unwrap_err();
        assert!(matches!(err, RagError::Load(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_load_error() {
        let file = temp_file(".txt", &[0xff, 0xfe, 0xfd]);
        let err = TextLoader.load(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let err = TextLoader
            .load(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "LoadError");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let file = temp_file(".docx", b"binary");
        let err = FileLoader::new().load(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[tokio::test]
    async fn test_pdf_loader_missing_binary() {
        let file = temp_file(".pdf", b"%PDF-1.4");
        let loader = PdfLoader::with_binary("pdftotext-does-not-exist");
        let err = loader.load(file.path()).await.unwrap_err();
        assert!(matches!(err, RagError::Load(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_loader_runs_as_spawned_task() {
        let file = temp_file(".md", b"# Visit\n\nPrescribed metformin.\x0cFollow-up.");
        let path = file.path().to_path_buf();
        let loader: std::sync::Arc<dyn DocumentLoader> = std::sync::Arc::new(FileLoader::new());

        let handle = tokio::spawn(async move { loader.load(&path).await });
        let doc = handle.await.unwrap().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].text, "Follow-up.");
    }
}
