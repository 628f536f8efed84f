//! Document model and loaders
//!
//! A `Document` is the ordered list of pages a loader extracted from a file.
//! It is immutable once produced; the pipeline only reads it.

pub mod loader;

pub use loader::{DocumentLoader, FileLoader, PdfLoader, TextLoader};

use serde::{Deserialize, Serialize};

/// One page of extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub text: String,
    /// 1-based page number
    pub page_number: usize,
    pub source_path: String,
}

/// Ordered sequence of pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Build a document from raw page texts, numbering pages from 1
    pub fn from_texts<I, S>(source_path: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page {
                text: text.into(),
                page_number: i + 1,
                source_path: source_path.to_string(),
            })
            .collect();
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total characters across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}
