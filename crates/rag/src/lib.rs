//! docqa retrieval core.
//!
//! Incremental indexing over a document corpus plus grounded question
//! answering: change-aware chunking, embedding, similarity retrieval with
//! normalized relevance, and cited answer synthesis.

pub mod chunker;
pub mod embeddings;
pub mod fingerprint;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod store;
pub mod synthesis;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use pipeline::IndexingPipeline;
pub use retriever::{Retriever, DEFAULT_N_RESULTS};
pub use synthesis::{Synthesizer, NO_INFORMATION_FALLBACK};
pub use types::{
    Answer, Chunk, ChunkingConfig, Document, EmbeddedChunk, IndexStats, RetrievalResult,
    SourceAttribution,
};
