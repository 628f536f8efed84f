// Fixed-window chunking of page text
//
// Windows are measured in characters (Unicode scalar values), so a chunk
// never splits a UTF-8 sequence. Consecutive windows of one page share
// exactly `overlap` characters; only the last window of a page may be short.

use serde::{Deserialize, Serialize};

use crate::document::Page;
use crate::errors::{RagError, Result};

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_path: String,
    pub page_number: usize,
    /// Character offset of the chunk within its page
    pub start_offset: usize,
}

/// A bounded span of document text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Document-wide sequence number, used for tie-breaking
    pub index: usize,
}

/// Splits pages into overlapping fixed-size chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkSplitter {
    /// Fails with `RagError::Config` unless `chunk_size > 0` and `overlap < chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "overlap ({}) must be less than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split every page, numbering chunks across the whole document
    pub fn split(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            for (start_offset, text) in self.windows(&page.text) {
                chunks.push(Chunk {
                    text: text.to_string(),
                    metadata: ChunkMetadata {
                        source_path: page.source_path.clone(),
                        page_number: page.page_number,
                        start_offset,
                    },
                    index: chunks.len(),
                });
            }
        }

        chunks
    }

    /// Character windows over `text` as (start offset, slice) pairs
    pub fn windows<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte position of every char boundary, end of text included
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            windows.push((start, &text[boundaries[start]..boundaries[end]]));
            if end == char_count {
                break;
            }
            start += step;
        }

        windows
    }
}

/// Split `pages` into chunks of `chunk_size` characters with `overlap`
pub fn split(pages: &[Page], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(ChunkSplitter::new(chunk_size, overlap)?.split(pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn pages(texts: &[&str]) -> Vec<Page> {
        Document::from_texts("doc.txt", texts.iter().copied())
            .pages()
            .to_vec()
    }

    #[test]
    fn test_rejects_overlap_not_less_than_size() {
        let err = ChunkSplitter::new(10, 10).unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
        assert!(ChunkSplitter::new(10, 11).is_err());
        assert!(ChunkSplitter::new(0, 0).is_err());
        assert!(ChunkSplitter::new(10, 9).is_ok());
    }

    #[test]
    fn test_short_page_is_single_chunk() {
        let chunks = split(&pages(&["Follow-up in 3 months."]), 50, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Follow-up in 3 months.");
        assert_eq!(chunks[0].metadata.start_offset, 0);
    }

    #[test]
    fn test_windows_advance_by_step() {
        let splitter = ChunkSplitter::new(4, 1).unwrap();
        let windows = splitter.windows("abcdefghij");
        let texts: Vec<&str> = windows.iter().map(|(_, t)| *t).collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
        assert_eq!(windows[1].0, 3);
    }

    #[test]
    fn test_final_chunk_may_be_short() {
        let splitter = ChunkSplitter::new(4, 0).unwrap();
        let texts: Vec<&str> = splitter
            .windows("abcdefghij")
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_empty_page_yields_no_chunks() {
        let chunks = split(&pages(&["", "text"]), 10, 2).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.page_number, 2);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_indices_are_document_wide() {
        let chunks = split(&pages(&["aaaaaaaa", "bbbbbbbb"]), 4, 0).unwrap();
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(chunks[2].metadata.page_number, 2);
    }

    #[test]
    fn test_multibyte_characters() {
        let splitter = ChunkSplitter::new(3, 1).unwrap();
        let texts: Vec<&str> = splitter
            .windows("héllo wörld")
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(texts[0], "hél");
        assert_eq!(texts[1], "llo");
        assert!(texts.iter().all(|t| t.chars().count() <= 3));
    }
}
