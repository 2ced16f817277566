//! Stats command handler.
//!
//! Reports indexed chunk/source counts and tracked fingerprints.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_rag::embeddings;
use docqa_rag::fingerprint::FingerprintMap;
use docqa_rag::store::SqliteStore;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let (chunks, sources) = if config.index_path().exists() {
            let embedder = embeddings::create_provider(
                &config.embedding_provider,
                &config.embedding_model,
                config.embedding_dimensions,
                config.embedding_endpoint.as_deref(),
            )?;
            let store = SqliteStore::open(&config.index_path(), embedder)?;
            store.counts()?
        } else {
            (0, 0)
        };

        let fingerprints = FingerprintMap::load(&config.fingerprint_path());

        if self.json {
            let output = serde_json::json!({
                "chunks": chunks,
                "sources": sources,
                "trackedDocuments": fingerprints.len(),
                "indexPath": config.index_path(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Index: {:?}", config.index_path());
            println!("  Chunks: {}", chunks);
            println!("  Sources: {}", sources);
            println!("  Tracked documents: {}", fingerprints.len());
        }

        Ok(())
    }
}
