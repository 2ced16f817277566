//! Answer synthesis.
//!
//! Turns ranked retrieval results into a cited, confidence-scored answer:
//! build a grounding context, constrain the generator to it, and attribute
//! the answer to its best-scoring source chunks.

use crate::types::{Answer, RetrievalResult, SourceAttribution};
use docqa_core::AppResult;
use docqa_llm::{LlmClient, LlmRequest};
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed reply when retrieval produced no grounding, and the refusal the
/// generator is instructed to use when the context is insufficient.
pub const NO_INFORMATION_FALLBACK: &str =
    "I don't have information about this in my knowledge base.";

/// Maximum attribution snippet length in characters.
const SNIPPET_MAX_CHARS: usize = 150;

/// Maximum number of cited sources.
const MAX_SOURCES: usize = 5;

/// Weights applied to the 1st, 2nd, and 3rd ranked result percentages when
/// aggregating overall relevance.
const RELEVANCE_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

/// Sampling temperature for grounded answering.
const ANSWER_TEMPERATURE: f32 = 0.3;

/// Synthesizes answers from ranked retrieval results.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl Synthesizer {
    /// Create a synthesizer over a generation client.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Generate a cited answer for the question.
    ///
    /// `ranked` must be sorted most relevant first (the retriever's output
    /// order). With no results, the fixed fallback is returned and the
    /// generator is never called.
    pub async fn synthesize(
        &self,
        question: &str,
        ranked: &[RetrievalResult],
    ) -> AppResult<Answer> {
        if ranked.is_empty() {
            tracing::info!("No grounding available; returning fallback answer");
            return Ok(Answer {
                answer: NO_INFORMATION_FALLBACK.to_string(),
                sources: Vec::new(),
                overall_relevance: 0,
            });
        }

        let sources = dedupe_sources(ranked);
        let overall_relevance = overall_relevance(ranked);

        // Context uses every ranked chunk, duplicates included; dedup only
        // affects the citations.
        let context = build_context(ranked);
        let instruction = build_instruction(&context);

        tracing::debug!(
            "Synthesizing answer from {} chunks ({} distinct sources, overall relevance {}%)",
            ranked.len(),
            sources.len(),
            overall_relevance
        );

        let request = LlmRequest::new(question, &self.model)
            .with_system(instruction)
            .with_temperature(ANSWER_TEMPERATURE);

        let response = self.client.complete(&request).await?;

        Ok(Answer {
            answer: response.content,
            sources,
            overall_relevance,
        })
    }
}

/// Keep the best-scoring chunk per source, descending by relevance,
/// at most [`MAX_SOURCES`] entries.
fn dedupe_sources(ranked: &[RetrievalResult]) -> Vec<SourceAttribution> {
    let mut best: HashMap<&str, &RetrievalResult> = HashMap::new();

    for result in ranked {
        let keep = match best.get(result.source.as_str()) {
            Some(current) => result.relevance_score > current.relevance_score,
            None => true,
        };
        if keep {
            best.insert(result.source.as_str(), result);
        }
    }

    let mut attributions: Vec<SourceAttribution> = best
        .into_values()
        .map(|result| SourceAttribution {
            name: result.source.clone(),
            relevance: result.relevance_percentage,
            text_snippet: truncate_snippet(&result.text),
        })
        .collect();

    attributions.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    attributions.truncate(MAX_SOURCES);
    attributions
}

/// Concatenate ranked chunk texts, blank-line separated.
fn build_context(ranked: &[RetrievalResult]) -> String {
    ranked
        .iter()
        .map(|result| result.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compose the system instruction constraining generation to the context.
fn build_instruction(context: &str) -> String {
    format!(
        "You are a question-answering assistant that only responds based on the provided context. \
         Follow these rules strictly:\n\
         1. Only use information from the provided context to answer.\n\
         2. If the context doesn't contain information to answer the question, respond with: '{}'\n\
         3. Never make up or infer information not present in the context.\n\
         4. Do not use any prior knowledge beyond the given context.\n\
         5. Provide a clear, concise answer (3-5 sentences maximum).\n\
         6. Do not mention that you're using 'context' or 'documents' in your answer.\n\n\
         Context:\n{}\n\n",
        NO_INFORMATION_FALLBACK, context
    )
}

/// Weighted aggregate of the top-ranked percentages, truncated to an
/// integer. Results beyond the third contribute nothing.
fn overall_relevance(ranked: &[RetrievalResult]) -> u32 {
    let weighted: f64 = ranked
        .iter()
        .zip(RELEVANCE_WEIGHTS)
        .map(|(result, weight)| f64::from(result.relevance_percentage) * weight)
        .sum();

    weighted.floor() as u32
}

/// First 150 characters, ellipsis-suffixed if anything was cut.
fn truncate_snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::AppResult;
    use docqa_llm::{LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Generation double recording requests and returning a fixed answer.
    struct StubClient {
        calls: AtomicUsize,
        last_request: Mutex<Option<LlmRequest>>,
    }

    impl StubClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for StubClient {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(LlmResponse {
                content: "The sky is blue.".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn result(text: &str, source: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            source: source.to_string(),
            relevance_score: score,
            relevance_percentage: (score * 100.0).floor() as u32,
        }
    }

    #[tokio::test]
    async fn test_synthesize_returns_answer_with_sources() {
        let client = StubClient::new();
        let synthesizer = Synthesizer::new(client.clone(), "test-model");
        let ranked = vec![
            result("The sky is blue.", "doc.txt", 0.9),
            result("Grass is green.", "garden.txt", 0.7),
        ];

        let answer = synthesizer.synthesize("What color is the sky?", &ranked).await.unwrap();

        assert_eq!(answer.answer, "The sky is blue.");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].name, "doc.txt");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_synthesize_empty_results_is_fallback_without_generation() {
        let client = StubClient::new();
        let synthesizer = Synthesizer::new(client.clone(), "test-model");

        let answer = synthesizer.synthesize("Anything?", &[]).await.unwrap();

        assert_eq!(answer.answer, NO_INFORMATION_FALLBACK);
        assert!(answer.sources.is_empty());
        assert_eq!(answer.overall_relevance, 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_instruction_contains_context_of_all_ranked_chunks() {
        let client = StubClient::new();
        let synthesizer = Synthesizer::new(client.clone(), "test-model");
        let ranked = vec![
            result("first chunk", "doc.txt", 0.9),
            result("second chunk", "doc.txt", 0.4),
        ];

        synthesizer.synthesize("q", &ranked).await.unwrap();

        let request = client.last_request.lock().unwrap().clone().unwrap();
        let system = request.system.unwrap();
        // Both chunks of the same source appear in the context even though
        // citations are deduplicated
        assert!(system.contains("first chunk\n\nsecond chunk"));
        assert!(system.contains(NO_INFORMATION_FALLBACK));
        assert_eq!(request.prompt, "q");
    }

    #[test]
    fn test_dedupe_keeps_highest_score_per_source() {
        let ranked = vec![
            result("strong match", "doc.txt", 0.9),
            result("weak match", "doc.txt", 0.4),
        ];

        let sources = dedupe_sources(&ranked);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].relevance, 90);
        assert_eq!(sources[0].text_snippet, "strong match");
    }

    #[test]
    fn test_dedupe_sorts_descending_and_limits_to_five() {
        let ranked: Vec<RetrievalResult> = (0..7)
            .map(|i| result("text", &format!("doc{}.txt", i), 0.1 + 0.1 * i as f32))
            .collect();

        let sources = dedupe_sources(&ranked);
        assert_eq!(sources.len(), 5);
        for pair in sources.windows(2) {
            assert!(pair[0].relevance >= pair[1].relevance);
        }
        assert_eq!(sources[0].name, "doc6.txt");
    }

    #[test]
    fn test_overall_relevance_weighted_truncated() {
        let ranked = vec![
            result("a", "a.txt", 0.90),
            result("b", "b.txt", 0.70),
            result("c", "c.txt", 0.50),
        ];
        // floor(90*0.5 + 70*0.3 + 50*0.2) = floor(45 + 21 + 10) = 76
        assert_eq!(overall_relevance(&ranked), 76);
    }

    #[test]
    fn test_overall_relevance_fewer_than_three_results() {
        let one = vec![result("a", "a.txt", 0.80)];
        // floor(80 * 0.5) = 40
        assert_eq!(overall_relevance(&one), 40);

        let two = vec![result("a", "a.txt", 0.80), result("b", "b.txt", 0.60)];
        // floor(80*0.5 + 60*0.3) = floor(40 + 18) = 58
        assert_eq!(overall_relevance(&two), 58);
    }

    #[test]
    fn test_overall_relevance_ignores_results_beyond_third() {
        let mut ranked = vec![
            result("a", "a.txt", 0.90),
            result("b", "b.txt", 0.70),
            result("c", "c.txt", 0.50),
        ];
        let baseline = overall_relevance(&ranked);

        ranked.push(result("d", "d.txt", 0.99));
        assert_eq!(overall_relevance(&ranked), baseline);
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("short"), "short");

        let long = "x".repeat(200);
        let snippet = truncate_snippet(&long);
        assert_eq!(snippet.chars().count(), SNIPPET_MAX_CHARS + 3);
        assert!(snippet.ends_with("..."));

        let exact = "y".repeat(SNIPPET_MAX_CHARS);
        assert_eq!(truncate_snippet(&exact), exact);
    }

    #[test]
    fn test_build_context_preserves_rank_order() {
        let ranked = vec![
            result("alpha", "a.txt", 0.9),
            result("beta", "b.txt", 0.8),
            result("gamma", "c.txt", 0.7),
        ];
        assert_eq!(build_context(&ranked), "alpha\n\nbeta\n\ngamma");
    }
}
