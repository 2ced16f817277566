//! Similarity retrieval and relevance ranking.
//!
//! Raw store distances are not human-interpretable; this module converts
//! them into a monotonically-increasing relevance scale for synthesis and
//! display.

use crate::store::VectorStore;
use crate::types::RetrievalResult;
use docqa_core::AppResult;
use std::sync::Arc;

/// Default number of chunks retrieved per question.
pub const DEFAULT_N_RESULTS: usize = 5;

/// Retrieves and ranks chunks relevant to a question.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a retriever over a vector store.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Return up to `n_results` chunks for the question, most relevant
    /// first.
    ///
    /// Zero hits is a valid terminal state ("no grounding available"),
    /// not an error. Equal scores keep the store's original order.
    pub async fn query(
        &self,
        question: &str,
        n_results: usize,
    ) -> AppResult<Vec<RetrievalResult>> {
        let response = self.store.query(question, n_results).await?;

        if response.is_empty() {
            tracing::info!("No chunks found for question");
            return Ok(Vec::new());
        }

        response.check_parallel()?;

        let metric = self.store.metric();
        let mut results: Vec<RetrievalResult> = response
            .documents
            .into_iter()
            .zip(response.distances)
            .zip(response.metadatas)
            .map(|((text, distance), metadata)| {
                let relevance_score = metric.relevance_score(distance);
                RetrievalResult {
                    text,
                    source: metadata.source,
                    relevance_score,
                    relevance_percentage: (relevance_score * 100.0).floor() as u32,
                }
            })
            .collect();

        // Stable sort: retrieval order breaks ties
        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            "Ranked {} chunks (top score: {:.3})",
            results.len(),
            results.first().map(|r| r.relevance_score).unwrap_or(0.0)
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChunkMetadata, DistanceMetric, QueryResponse};
    use docqa_core::AppResult;

    /// Store double returning a canned response.
    struct FakeStore {
        response: QueryResponse,
    }

    #[async_trait::async_trait]
    impl VectorStore for FakeStore {
        fn metric(&self) -> DistanceMetric {
            DistanceMetric::Cosine
        }

        async fn upsert(
            &self,
            _id: &str,
            _text: &str,
            _embedding: &[f32],
            _metadata: &ChunkMetadata,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn query(&self, _text: &str, _n_results: usize) -> AppResult<QueryResponse> {
            Ok(self.response.clone())
        }
    }

    fn response(rows: &[(&str, f32, &str)]) -> QueryResponse {
        QueryResponse {
            documents: rows.iter().map(|(t, _, _)| t.to_string()).collect(),
            distances: rows.iter().map(|(_, d, _)| *d).collect(),
            metadatas: rows
                .iter()
                .map(|(_, _, s)| ChunkMetadata {
                    source: s.to_string(),
                })
                .collect(),
        }
    }

    fn retriever(rows: &[(&str, f32, &str)]) -> Retriever {
        Retriever::new(Arc::new(FakeStore {
            response: response(rows),
        }))
    }

    #[tokio::test]
    async fn test_query_converts_distance_to_relevance() {
        let retriever = retriever(&[("text", 0.4, "doc.txt")]);
        let results = retriever.query("q", 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].relevance_score - 0.8).abs() < 1e-6);
        assert_eq!(results[0].relevance_percentage, 80);
        assert_eq!(results[0].source, "doc.txt");
    }

    #[tokio::test]
    async fn test_query_smaller_distance_ranks_higher() {
        let retriever = retriever(&[
            ("far", 1.2, "a.txt"),
            ("near", 0.1, "b.txt"),
            ("middle", 0.6, "c.txt"),
        ]);
        let results = retriever.query("q", 5).await.unwrap();

        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["near", "middle", "far"]);
        assert!(results[0].relevance_score > results[1].relevance_score);
        assert!(results[1].relevance_score > results[2].relevance_score);
    }

    #[tokio::test]
    async fn test_query_equal_scores_keep_retrieval_order() {
        let retriever = retriever(&[
            ("first", 0.5, "a.txt"),
            ("second", 0.5, "b.txt"),
            ("third", 0.5, "c.txt"),
        ]);
        let results = retriever.query("q", 5).await.unwrap();

        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_query_empty_store_returns_empty() {
        let retriever = retriever(&[]);
        let results = retriever.query("q", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_out_of_range_distance_clamps() {
        let retriever = retriever(&[("odd", 2.4, "a.txt")]);
        let results = retriever.query("q", 5).await.unwrap();

        assert_eq!(results[0].relevance_score, 0.0);
        assert_eq!(results[0].relevance_percentage, 0);
    }

    #[tokio::test]
    async fn test_query_rejects_mismatched_arrays() {
        let mut bad = response(&[("text", 0.4, "doc.txt")]);
        bad.distances.push(0.9);
        let retriever = Retriever::new(Arc::new(FakeStore { response: bad }));

        assert!(retriever.query("q", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_query_percentage_floors() {
        // relevance 0.999 -> 99%, never rounded up to 100
        let retriever = retriever(&[("text", 0.002, "doc.txt")]);
        let results = retriever.query("q", 5).await.unwrap();
        assert_eq!(results[0].relevance_percentage, 99);
    }
}
