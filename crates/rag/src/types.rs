//! Pipeline type definitions.
//!
//! Loosely structured collaborator responses are converted into these
//! records at the boundary; nothing downstream handles untyped maps.

use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A source document loaded from the corpus directory.
///
/// Immutable once loaded; lives for one indexing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (the source filename)
    pub id: String,

    /// Full extracted text
    pub text: String,

    /// Originating filename
    pub source: String,
}

/// A bounded, overlapping window of a source document.
///
/// The unit of embedding and retrieval. Ids are stable across runs for the
/// same document content so re-upserting overwrites instead of duplicating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<document.id>_chunk<n>`, 1-based within the document
    pub id: String,

    /// Window text (non-empty after trimming)
    pub text: String,

    /// Originating document id
    pub source: String,
}

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One ranked retrieval hit. Ephemeral; exists for the duration of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Chunk text
    pub text: String,

    /// Originating document id
    pub source: String,

    /// Normalized relevance in [0, 1]
    pub relevance_score: f32,

    /// floor(relevance_score * 100)
    pub relevance_percentage: u32,
}

/// Per-source citation: the best-scoring chunk seen for that source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    /// Source document id
    pub name: String,

    /// Best relevance percentage among returned chunks of this source
    pub relevance: u32,

    /// Truncated excerpt of the best chunk
    pub text_snippet: String,
}

/// A synthesized, cited answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text (or the fixed fallback)
    pub answer: String,

    /// Deduplicated attributions, descending relevance, at most 5
    pub sources: Vec<SourceAttribution>,

    /// Weighted aggregate of the top-ranked percentages, in [0, 100]
    pub overall_relevance: u32,
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive windows
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    20
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Create a validated configuration.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the window-advance constraint `0 <= overlap < size`.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({}); the window would never advance",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Characters the window advances per step.
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Statistics from one indexing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents found in the corpus directory
    pub documents_seen: u32,

    /// Documents that were new or modified and got reprocessed
    pub documents_reprocessed: u32,

    /// Chunks embedded and upserted during the pass
    pub chunks_indexed: u32,

    /// Wall-clock duration in seconds
    pub duration_secs: f64,

    /// When the pass finished
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_config_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 20);
        assert_eq!(config.step(), 980);
    }

    #[test]
    fn test_chunking_config_rejects_overlap_not_below_size() {
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 120).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 0).is_ok());
        assert!(ChunkingConfig::new(100, 99).is_ok());
    }

    #[test]
    fn test_answer_serialization_shape() {
        let answer = Answer {
            answer: "The sky is blue.".to_string(),
            sources: vec![SourceAttribution {
                name: "doc.txt".to_string(),
                relevance: 91,
                text_snippet: "The sky is blue.".to_string(),
            }],
            overall_relevance: 91,
        };

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["sources"][0]["name"], "doc.txt");
        assert_eq!(json["overall_relevance"], 91);
    }
}
