//! Ask command handler.
//!
//! Retrieves relevant chunks for a question and synthesizes a cited answer.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_rag::store::SqliteStore;
use docqa_rag::{embeddings, Retriever, Synthesizer};
use std::sync::Arc;

/// Ask a question grounded in the indexed corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let embedder = embeddings::create_provider(
            &config.embedding_provider,
            &config.embedding_model,
            config.embedding_dimensions,
            config.embedding_endpoint.as_deref(),
        )?;

        let store = Arc::new(SqliteStore::open(&config.index_path(), embedder)?);
        let retriever = Retriever::new(store);

        let top_k = self.top_k.unwrap_or(config.top_k);
        let ranked = retriever.query(&self.question, top_k).await?;

        tracing::debug!("Retrieved {} ranked chunks", ranked.len());

        let api_key = config.resolve_api_key();
        let client = docqa_llm::create_client(
            &config.provider,
            config.llm_endpoint.as_deref(),
            api_key.as_deref(),
        )?;

        let synthesizer = Synthesizer::new(client, config.model.clone());
        let answer = synthesizer.synthesize(&self.question, &ranked).await?;

        if self.json {
            // Same shape the original service returned over HTTP
            let output = serde_json::json!({
                "message": answer.answer,
                "sources": answer.sources,
                "relevance_score": answer.overall_relevance,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.answer);
            println!();

            if answer.sources.is_empty() {
                println!("Sources: (none)");
            } else {
                println!("Sources (overall relevance {}%):", answer.overall_relevance);
                for source in &answer.sources {
                    println!("- {} ({}%): {}", source.name, source.relevance, source.text_snippet);
                }
            }
        }

        Ok(())
    }
}
