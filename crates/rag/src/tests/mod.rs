//! Integration tests for the indexing and answering pipeline.
