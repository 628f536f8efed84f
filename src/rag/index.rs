//! In-memory vector index
//!
//! Exact cosine-similarity scan over every entry. The index is built once
//! from all entries and never mutated; re-ingesting builds a new one.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::errors::{RagError, Result};
use crate::rag::chunker::Chunk;

/// A chunk and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// Chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Top-k hits, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Chunks in retrieved order
    pub fn chunks(&self) -> Vec<Chunk> {
        self.hits.iter().map(|h| h.chunk.clone()).collect()
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.hits.into_iter().map(|h| h.chunk).collect()
    }
}

/// Immutable brute-force index
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
    dimension: usize,
}

impl VectorIndex {
    /// Build from all entries at once.
    ///
    /// Fails with `EmptyIndex` for no entries and `DimensionMismatch` when
    /// entries disagree on dimensionality.
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let dimension = match entries.first() {
            Some(entry) => entry.vector.len(),
            None => return Err(RagError::EmptyIndex),
        };

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: bad.vector.len(),
            });
        }

        let norms = entries.iter().map(|e| l2_norm(&e.vector)).collect();

        Ok(Self {
            entries,
            norms,
            dimension,
        })
    }

    /// The `k` entries most similar to `vector`.
    ///
    /// Ordered by descending cosine similarity, ties by ascending chunk
    /// index. `k` larger than the index returns every entry.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult> {
        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let query_norm = l2_norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (entry, norm))| (i, cosine(vector, query_norm, &entry.vector, *norm)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.entries[a.0].chunk.index.cmp(&self.entries[b.0].chunk.index))
        });
        scored.truncate(k);

        Ok(RetrievalResult {
            hits: scored
                .into_iter()
                .map(|(i, score)| ScoredChunk {
                    chunk: self.entries[i].chunk.clone(),
                    score,
                })
                .collect(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a built index
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity with precomputed norms; zero vectors score 0
fn cosine(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let score = dot / (norm_a * norm_b);
    if score.is_nan() {
        0.0
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunker::ChunkMetadata;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source_path: "doc.txt".to_string(),
                page_number: 1,
                start_offset: 0,
            },
            index,
        }
    }

    fn index_of(vectors: Vec<Vec<f32>>) -> VectorIndex {
        let entries = vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| IndexEntry::new(chunk(i, &format!("chunk {}", i)), v))
            .collect();
        VectorIndex::build(entries).unwrap()
    }

    #[test]
    fn test_empty_build_fails() {
        assert!(matches!(
            VectorIndex::build(Vec::new()),
            Err(RagError::EmptyIndex)
        ));
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let entries = vec![
            IndexEntry::new(chunk(0, "a"), vec![1.0, 0.0]),
            IndexEntry::new(chunk(1, "b"), vec![1.0, 0.0, 0.0]),
        ];
        assert!(matches!(
            VectorIndex::build(entries),
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let index = index_of(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]]);
        let result = index.query(&[1.0, 0.1], 2).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].chunk.index, 1);
        assert_eq!(result.hits[1].chunk.index, 2);
        assert!(result.hits[0].score >= result.hits[1].score);
    }

    #[test]
    fn test_ties_broken_by_chunk_index() {
        let index = index_of(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]]);
        let result = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = result.hits.iter().map(|h| h.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_k_larger_than_index_returns_all() {
        let index = index_of(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let result = index.query(&[0.0, 1.0], 10).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].chunk.index, 1);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = index_of(vec![vec![0.5; 768]]);
        let err = index.query(&vec![0.5; 384], 1).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 768,
                actual: 384
            }
        ));
        assert_eq!(index.len(), 1);
        assert_eq!(index.dimension(), 768);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let index = index_of(vec![vec![0.0, 0.0], vec![1.0, 0.0]]);
        let result = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(result.hits[0].chunk.index, 1);
        assert_eq!(result.hits[1].score, 0.0);
    }

    #[test]
    fn test_query_is_deterministic() {
        let index = index_of(vec![vec![0.3, 0.4], vec![0.4, 0.3], vec![0.5, 0.5]]);
        let first = index.query(&[0.2, 0.9], 3).unwrap();
        for _ in 0..10 {
            assert_eq!(index.query(&[0.2, 0.9], 3).unwrap(), first);
        }
    }
}
