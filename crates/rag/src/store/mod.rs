//! Vector store abstraction.
//!
//! The indexing pipeline and retriever talk to the store only through the
//! [`VectorStore`] trait: `upsert` one embedded chunk at a time, `query`
//! returning parallel arrays of documents, distances, and metadata.

pub mod sqlite;

pub use sqlite::SqliteStore;

use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// The distance convention a store reports.
///
/// Relevance conversion dispatches on this instead of hardcoding one
/// normalization; a store with a different metric adds a variant and a
/// conversion arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Cosine distance in [0, 2]: 0 = identical, 2 = maximally dissimilar
    Cosine,
}

impl DistanceMetric {
    /// Convert a raw distance into a relevance score in [0, 1],
    /// higher meaning more relevant.
    pub fn relevance_score(self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => (1.0 - distance / 2.0).clamp(0.0, 1.0),
        }
    }
}

/// Per-chunk metadata stored alongside the embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating document id
    pub source: String,
}

/// Result of a similarity query: parallel arrays of equal length, nearest
/// chunk first.
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    /// Chunk texts
    pub documents: Vec<String>,

    /// Raw distances, per the store's [`DistanceMetric`]
    pub distances: Vec<f32>,

    /// Chunk metadata
    pub metadatas: Vec<ChunkMetadata>,
}

impl QueryResponse {
    /// Number of hits.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the query matched nothing.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Validate the parallel-array invariant at the collaborator boundary.
    pub fn check_parallel(&self) -> AppResult<()> {
        if self.distances.len() != self.documents.len()
            || self.metadatas.len() != self.documents.len()
        {
            return Err(AppError::Retrieval(format!(
                "Store returned mismatched arrays: {} documents, {} distances, {} metadatas",
                self.documents.len(),
                self.distances.len(),
                self.metadatas.len()
            )));
        }
        Ok(())
    }
}

/// Trait for vector stores.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// The distance convention `query` reports.
    fn metric(&self) -> DistanceMetric;

    /// Insert or overwrite one chunk by id.
    async fn upsert(
        &self,
        id: &str,
        text: &str,
        embedding: &[f32],
        metadata: &ChunkMetadata,
    ) -> AppResult<()>;

    /// Return up to `n_results` nearest chunks for the query text.
    async fn query(&self, text: &str, n_results: usize) -> AppResult<QueryResponse>;
}
