//! The indexing pipeline.
//!
//! One batch pass over the corpus: load documents, decide what changed,
//! chunk and embed only that subset, upsert into the vector store, and
//! persist the refreshed fingerprint map. Re-running on an unchanged
//! corpus makes zero embedder and store calls.

use crate::chunker;
use crate::embeddings::{self, EmbeddingProvider};
use crate::fingerprint::{self, FingerprintMap};
use crate::loader;
use crate::store::{ChunkMetadata, VectorStore};
use crate::types::{ChunkingConfig, IndexStats};
use chrono::Utc;
use docqa_core::{AppError, AppResult};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates one indexing pass.
pub struct IndexingPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
    state_dir: PathBuf,
}

impl IndexingPipeline {
    /// Create a pipeline writing its state under `state_dir`.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingConfig,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            store,
            chunking,
            state_dir: state_dir.into(),
        }
    }

    fn fingerprint_path(&self) -> PathBuf {
        self.state_dir.join("fingerprints.json")
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir.join("index.lock")
    }

    /// Run one indexing pass over the corpus directory.
    ///
    /// With `full_reindex`, stored fingerprints are ignored so every
    /// document re-embeds and re-upserts over its stable chunk ids.
    ///
    /// Ordering invariant: the fingerprint map is persisted only after the
    /// affected documents' chunks were all upserted, so a failed pass
    /// re-processes next time instead of silently skipping.
    pub async fn run(&self, corpus_dir: &Path, full_reindex: bool) -> AppResult<IndexStats> {
        let start = Instant::now();
        let _lock = IndexLock::acquire(&self.lock_path())?;

        let documents = loader::load_documents(corpus_dir)?;
        let documents_seen = documents.len() as u32;

        let previous = if full_reindex {
            tracing::info!("Full reindex requested; ignoring stored fingerprints");
            FingerprintMap::default()
        } else {
            FingerprintMap::load(&self.fingerprint_path())
        };

        let (to_process, updated) = fingerprint::detect_changes(&documents, &previous);

        if to_process.is_empty() {
            tracing::info!("No new or modified documents; index is up to date");
            updated.persist(&self.fingerprint_path())?;
            return Ok(IndexStats {
                documents_seen,
                documents_reprocessed: 0,
                chunks_indexed: 0,
                duration_secs: start.elapsed().as_secs_f64(),
                completed_at: Utc::now(),
            });
        }

        tracing::info!("Processing {} new or modified documents", to_process.len());

        let chunks = chunker::preprocess_documents(&to_process, &self.chunking)?;
        let embedded = embeddings::embed_chunks(self.embedder.as_ref(), chunks).await?;

        for item in &embedded {
            let metadata = ChunkMetadata {
                source: item.chunk.source.clone(),
            };
            self.store
                .upsert(&item.chunk.id, &item.chunk.text, &item.embedding, &metadata)
                .await?;
        }

        updated.persist(&self.fingerprint_path())?;

        let stats = IndexStats {
            documents_seen,
            documents_reprocessed: to_process.len() as u32,
            chunks_indexed: embedded.len() as u32,
            duration_secs: start.elapsed().as_secs_f64(),
            completed_at: Utc::now(),
        };

        tracing::info!(
            "Indexed {} chunks from {} documents in {:.2}s",
            stats.chunks_indexed,
            stats.documents_reprocessed,
            stats.duration_secs
        );

        Ok(stats)
    }
}

/// Exclusive lock guarding against concurrent indexing passes.
///
/// The lock file is created with `create_new` and removed when the guard
/// drops. Two passes racing on the fingerprint map would corrupt the
/// incremental decision, so a held lock fails fast.
struct IndexLock {
    path: PathBuf,
}

impl IndexLock {
    fn acquire(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Self {
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(AppError::Index(format!(
                "Another indexing pass holds the lock at {:?}; remove the file if no pass is running",
                path
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove lock file {:?}: {}", self.path, e);
        }
    }
}
