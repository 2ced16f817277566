//! Index command handler.
//!
//! Runs one indexing pass: change detection, chunking, embedding, upsert.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_rag::store::SqliteStore;
use docqa_rag::{embeddings, ChunkingConfig, IndexingPipeline};
use std::sync::Arc;

/// Run an indexing pass over the corpus
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Ignore stored fingerprints and reprocess every document
    #[arg(long)]
    pub full: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for corpus {:?}", config.corpus_dir);

        let embedder = embeddings::create_provider(
            &config.embedding_provider,
            &config.embedding_model,
            config.embedding_dimensions,
            config.embedding_endpoint.as_deref(),
        )?;

        let store = Arc::new(SqliteStore::open(&config.index_path(), embedder.clone())?);

        let chunking = ChunkingConfig::new(config.chunk_size, config.chunk_overlap)?;
        let pipeline = IndexingPipeline::new(embedder, store, chunking, config.state_dir());

        let full = self.full || config.full_reindex;
        let stats = pipeline.run(&config.corpus_dir, full).await?;

        if self.json {
            let output = serde_json::json!({
                "documentsSeen": stats.documents_seen,
                "documentsReprocessed": stats.documents_reprocessed,
                "chunksIndexed": stats.chunks_indexed,
                "durationSecs": stats.duration_secs,
                "completedAt": stats.completed_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if stats.documents_reprocessed == 0 {
            println!(
                "Index up to date ({} documents tracked)",
                stats.documents_seen
            );
        } else {
            println!(
                "Indexed {} chunks from {} of {} documents in {:.2}s",
                stats.chunks_indexed,
                stats.documents_reprocessed,
                stats.documents_seen,
                stats.duration_secs
            );
        }

        Ok(())
    }
}
