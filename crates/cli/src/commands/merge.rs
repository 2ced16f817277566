//! Merge command handler.
//!
//! Concatenates the corpus' text documents into a single file, blank-line
//! separated. Useful for feeding the whole corpus to external tools.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_rag::loader;
use std::path::PathBuf;

/// Merge the corpus' text documents into a single file
#[derive(Args, Debug)]
pub struct MergeCommand {
    /// Output file path
    #[arg(short, long, default_value = "merged_corpus.txt")]
    pub output: PathBuf,
}

impl MergeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(
            "Merging corpus {:?} into {:?}",
            config.corpus_dir,
            self.output
        );

        let documents = loader::load_documents(&config.corpus_dir)?;

        let merged = documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        std::fs::write(&self.output, merged)?;

        println!(
            "Merged {} documents into {:?}",
            documents.len(),
            self.output
        );

        Ok(())
    }
}
