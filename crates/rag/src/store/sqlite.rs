//! SQLite-backed vector store.
//!
//! Embeddings are stored as little-endian f32 blobs and queried by
//! exhaustive cosine scan. Fine for corpus sizes this pipeline targets;
//! an approximate index would slot in behind the same trait.

use crate::embeddings::EmbeddingProvider;
use crate::store::{ChunkMetadata, DistanceMetric, QueryResponse, VectorStore};
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite vector store.
///
/// Queries embed the question text through the same provider that embedded
/// the chunks, so stored and query vectors share one space.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                source TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite vector store at {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn lock_conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("Store connection lock poisoned".to_string()))
    }

    /// Count stored chunks and distinct sources.
    pub fn counts(&self) -> AppResult<(u64, u64)> {
        let conn = self.lock_conn()?;

        let chunks: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| AppError::Index(format!("Failed to count chunks: {}", e)))?;

        let sources: i64 = conn
            .query_row("SELECT COUNT(DISTINCT source) FROM chunks", [], |row| {
                row.get(0)
            })
            .map_err(|e| AppError::Index(format!("Failed to count sources: {}", e)))?;

        Ok((chunks as u64, sources as u64))
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteStore {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    async fn upsert(
        &self,
        id: &str,
        text: &str,
        embedding: &[f32],
        metadata: &ChunkMetadata,
    ) -> AppResult<()> {
        let blob = embedding_to_bytes(embedding);
        let conn = self.lock_conn()?;

        conn.execute(
            "INSERT OR REPLACE INTO chunks (id, text, embedding, source)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, text, blob, metadata.source],
        )
        .map_err(|e| AppError::Index(format!("Failed to upsert chunk '{}': {}", id, e)))?;

        Ok(())
    }

    async fn query(&self, text: &str, n_results: usize) -> AppResult<QueryResponse> {
        let query_embedding = self.embedder.embed(text).await?;

        let mut scored: Vec<(String, f32, String)> = {
            let conn = self.lock_conn()?;
            let mut stmt = conn
                .prepare("SELECT text, embedding, source FROM chunks")
                .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

            let rows = stmt
                .query_map([], |row| {
                    let text: String = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let source: String = row.get(2)?;
                    Ok((text, blob, source))
                })
                .map_err(|e| AppError::Index(format!("Failed to query chunks: {}", e)))?;

            let mut scored = Vec::new();
            for row in rows {
                let (chunk_text, blob, source) =
                    row.map_err(|e| AppError::Index(format!("Failed to read chunk row: {}", e)))?;
                let embedding = bytes_to_embedding(&blob)?;

                // Cosine distance: 0 = identical, 2 = opposite
                let distance = 1.0 - cosine_similarity(&query_embedding, &embedding);
                scored.push((chunk_text, distance, source));
            }
            scored
        };

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n_results);

        tracing::debug!(
            "Similarity query returned {} chunks (requested {})",
            scored.len(),
            n_results
        );

        let mut response = QueryResponse::default();
        for (chunk_text, distance, source) in scored {
            response.documents.push(chunk_text);
            response.distances.push(distance);
            response.metadatas.push(ChunkMetadata { source });
        }

        Ok(response)
    }
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding blob length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

/// Cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
