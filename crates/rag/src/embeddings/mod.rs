//! Embedding generation.
//!
//! Provider-agnostic embedding via the [`EmbeddingProvider`] trait.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use crate::types::{Chunk, EmbeddedChunk};
use docqa_core::{AppError, AppResult};

/// Embed a batch of chunks, pairing each chunk with its vector.
///
/// The embedder contract is all-or-nothing: a provider error fails the
/// whole batch, and the output must match the input in order and count.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: Vec<Chunk>,
) -> AppResult<Vec<EmbeddedChunk>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    tracing::info!(
        "Embedding {} chunks using provider '{}' (model: {})",
        chunks.len(),
        provider.provider_name(),
        provider.model_name()
    );

    let embeddings = provider.embed_batch(&texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(AppError::Index(format!(
            "Embedder returned {} vectors for {} chunks",
            embeddings.len(),
            chunks.len()
        )));
    }

    Ok(chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
        .collect())
}
