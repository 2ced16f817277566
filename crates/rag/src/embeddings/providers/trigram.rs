//! Trigram embedding provider.
//!
//! Deterministic, offline embeddings built from character trigrams and
//! word frequencies. Not semantically comparable to neural models, but
//! content-dependent and stable, which is what local development and the
//! test suite need.

use crate::embeddings::provider::EmbeddingProvider;
use docqa_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Common words excluded before hashing; they carry no discriminating
/// signal at this vector size.
const STOP_WORDS: [&str; 31] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they",
];

/// Trigram-based embedding provider for local, offline operation.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Build one normalized embedding from text content.
    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split_whitespace()
            .filter(|w| w.len() > 2 && !stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();

            // Spread each word over several dimensions via its trigrams
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let idx = fold_hash(trigram.as_bytes(), 37) as usize % self.dimensions;
                embedding[idx] += (*freq as f32).sqrt();
            }

            // And anchor the whole word on one dimension
            let idx = fold_hash(word.as_bytes(), 31) as usize % self.dimensions;
            embedding[idx] += *freq as f32;
        }

        normalize(&mut embedding);
        embedding
    }
}

/// Multiply-and-add byte fold with the given multiplier.
fn fold_hash(bytes: &[u8], multiplier: u64) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| {
        acc.wrapping_mul(multiplier).wrapping_add(u64::from(b))
    })
}

/// Scale a vector to unit length; zero vectors stay zero.
fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigram_provider_metadata() {
        let provider = TrigramProvider::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_embeddings_are_unit_vectors() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("hello world embedding").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_embeddings_deterministic() {
        let provider = TrigramProvider::new(384);
        let first = provider.embed("deterministic content").await.unwrap();
        let second = provider.embed("deterministic content").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = TrigramProvider::new(384);
        let first = provider.embed("blue sky over mountains").await.unwrap();
        let second = provider.embed("sqlite storage engine").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_matches_input_count() {
        let provider = TrigramProvider::new(64);
        let texts = vec![
            "first text".to_string(),
            "second text".to_string(),
            "third text".to_string(),
        ];
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
    }

    #[tokio::test]
    async fn test_multibyte_input_is_safe() {
        let provider = TrigramProvider::new(384);
        let embedding = provider
            .embed("zażółć gęślą jaźń, multibyte content")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
