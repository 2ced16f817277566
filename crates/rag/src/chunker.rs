//! Text chunking with configurable window size and overlap.
//!
//! Windows are measured in characters, not bytes, so multi-byte text never
//! splits inside a scalar value and the overlap guarantee holds regardless
//! of encoding width.

use crate::types::{Chunk, ChunkingConfig, Document};
use docqa_core::AppResult;

/// Split text into overlapping character windows.
///
/// Windows of `chunk_size` characters start at position 0 and advance by
/// `chunk_size - chunk_overlap` until the start reaches the end of the
/// text, so consecutive windows share exactly `chunk_overlap` characters
/// of context.
pub fn split_text(text: &str, config: &ChunkingConfig) -> AppResult<Vec<String>> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += config.step();
    }

    Ok(chunks)
}

/// Split documents into chunks with stable, per-document sequential ids.
///
/// Chunk indices are 1-based. Windows that are empty after trimming
/// (e.g., trailing whitespace-only tails) are dropped; the index still
/// advances so ids stay stable for identical content.
pub fn preprocess_documents(
    documents: &[Document],
    config: &ChunkingConfig,
) -> AppResult<Vec<Chunk>> {
    let mut chunks = Vec::new();

    for document in documents {
        tracing::debug!("Splitting document '{}' into chunks", document.id);
        let windows = split_text(&document.text, config)?;

        for (i, window) in windows.into_iter().enumerate() {
            if window.trim().is_empty() {
                continue;
            }

            chunks.push(Chunk {
                id: format!("{}_chunk{}", document.id, i + 1),
                text: window,
                source: document.id.clone(),
            });
        }
    }

    tracing::debug!(
        "Created {} chunks from {} documents",
        chunks.len(),
        documents.len()
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(size, overlap).unwrap()
    }

    fn document(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            text: text.to_string(),
            source: id.to_string(),
        }
    }

    #[test]
    fn test_split_chunk_count_matches_ceil() {
        // count = ceil(L / (S - O))
        for (len, size, overlap) in [(1000, 200, 50), (999, 100, 0), (10, 4, 1), (1, 100, 20)] {
            let text = "a".repeat(len);
            let chunks = split_text(&text, &config(size, overlap)).unwrap();
            let step = size - overlap;
            let expected = len.div_ceil(step);
            assert_eq!(chunks.len(), expected, "L={} S={} O={}", len, size, overlap);
        }
    }

    #[test]
    fn test_split_consecutive_chunks_overlap_exactly() {
        let text: String = ('a'..='z').cycle().take(260).collect();
        let overlap = 10;
        let chunks = split_text(&text, &config(50, overlap)).unwrap();

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            let tail: String = prev[prev.len() - overlap..].iter().collect();
            let head: String = next[..overlap.min(next.len())].iter().collect();
            assert_eq!(tail[..head.len()], head[..]);
        }
    }

    #[test]
    fn test_split_reconstructs_original_text() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);
        let cfg = config(100, 25);
        let chunks = split_text(&text, &cfg).unwrap();

        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i + 1 < chunks.len() {
                rebuilt.extend(chunk.chars().take(cfg.step()));
            } else {
                rebuilt.push_str(chunk);
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_split_empty_text() {
        let chunks = split_text("", &config(100, 10)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_split_multibyte_text() {
        let text = "śnieg i słońce ".repeat(20);
        let chunks = split_text(&text, &config(40, 5)).unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks
            .iter()
            .all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn test_split_rejects_invalid_overlap() {
        let bad = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        };
        assert!(split_text("hello", &bad).is_err());
    }

    #[test]
    fn test_preprocess_assigns_one_based_stable_ids() {
        let docs = vec![document("doc.txt", &"x".repeat(250))];
        let chunks = preprocess_documents(&docs, &config(100, 0)).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].id, "doc.txt_chunk1");
        assert_eq!(chunks[1].id, "doc.txt_chunk2");
        assert_eq!(chunks[2].id, "doc.txt_chunk3");
        assert!(chunks.iter().all(|c| c.source == "doc.txt"));

        // Same content, same ids
        let again = preprocess_documents(&docs, &config(100, 0)).unwrap();
        assert_eq!(chunks, again);
    }

    #[test]
    fn test_preprocess_single_small_document() {
        let docs = vec![document("doc.txt", "The sky is blue. Grass is green.")];
        let chunks = preprocess_documents(&docs, &ChunkingConfig::default()).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc.txt_chunk1");
        assert_eq!(chunks[0].text, "The sky is blue. Grass is green.");
    }

    #[test]
    fn test_preprocess_drops_whitespace_only_windows() {
        let mut text = "abc".to_string();
        text.push_str(&" ".repeat(10));
        let docs = vec![document("pad.txt", &text)];

        let chunks = preprocess_documents(&docs, &config(5, 0)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "pad.txt_chunk1");
    }

    #[test]
    fn test_preprocess_multiple_documents_independent_indices() {
        let docs = vec![
            document("a.txt", &"a".repeat(150)),
            document("b.txt", &"b".repeat(50)),
        ];
        let chunks = preprocess_documents(&docs, &config(100, 0)).unwrap();

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a.txt_chunk1", "a.txt_chunk2", "b.txt_chunk1"]);
    }
}
