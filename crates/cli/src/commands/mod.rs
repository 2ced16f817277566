//! Command handlers for the docqa CLI.

pub mod ask;
pub mod index;
pub mod merge;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use index::IndexCommand;
pub use merge::MergeCommand;
pub use stats::StatsCommand;
