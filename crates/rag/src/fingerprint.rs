//! Content fingerprints and the incremental re-indexing decision.
//!
//! Each document gets a deterministic SHA-256 hash over its raw text. The
//! persisted map of `document id -> hash` gates chunking and embedding: a
//! document is reprocessed iff its id is new or its hash changed. The map
//! is rewritten in full on every pass, so documents removed from the corpus
//! simply stop being tracked.

use crate::types::Document;
use docqa_core::AppResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Compute the content fingerprint of a document's text.
///
/// Equality checking only, not a security boundary.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persisted mapping from document id to content hash.
///
/// Serialized as a flat JSON object. BTreeMap keeps the file stable across
/// runs with identical content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintMap {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

impl FingerprintMap {
    /// Load the map from disk.
    ///
    /// A missing, unreadable, or malformed file degrades to an empty map
    /// (everything reprocesses) rather than failing the pipeline.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No fingerprint map at {:?}; treating as empty", path);
            return Self::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    "Failed to read fingerprint map {:?} ({}); reprocessing everything",
                    path,
                    e
                );
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    "Malformed fingerprint map {:?} ({}); reprocessing everything",
                    path,
                    e
                );
                Self::default()
            }
        }
    }

    /// Rewrite the map on disk in full.
    pub fn persist(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        tracing::debug!("Persisted {} fingerprints to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// Look up the recorded hash for a document id.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Record a hash for a document id.
    pub fn insert(&mut self, id: String, hash: String) {
        self.entries.insert(id, hash);
    }

    /// Number of tracked documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map tracks no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decide which documents need reprocessing.
///
/// Returns the new-or-modified subset together with the refreshed map
/// covering *all* current documents (unchanged ones included).
pub fn detect_changes(
    documents: &[Document],
    previous: &FingerprintMap,
) -> (Vec<Document>, FingerprintMap) {
    let mut updated = FingerprintMap::default();
    let mut to_process = Vec::new();

    for document in documents {
        let hash = fingerprint(&document.text);

        if previous.get(&document.id) != Some(hash.as_str()) {
            to_process.push(document.clone());
        }

        updated.insert(document.id.clone(), hash);
    }

    tracing::debug!(
        "{} of {} documents need reprocessing",
        to_process.len(),
        documents.len()
    );

    (to_process, updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            text: text.to_string(),
            source: id.to_string(),
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint("hello"), fingerprint("hello"));
        assert_ne!(fingerprint("hello"), fingerprint("hello!"));
    }

    #[test]
    fn test_detect_changes_all_new_on_empty_map() {
        let docs = vec![document("a.txt", "alpha"), document("b.txt", "beta")];
        let (to_process, updated) = detect_changes(&docs, &FingerprintMap::default());

        assert_eq!(to_process.len(), 2);
        assert_eq!(updated.len(), 2);
    }

    #[test]
    fn test_detect_changes_idempotent_second_run() {
        let docs = vec![document("a.txt", "alpha"), document("b.txt", "beta")];
        let (_, first_map) = detect_changes(&docs, &FingerprintMap::default());

        let (to_process, second_map) = detect_changes(&docs, &first_map);
        assert!(to_process.is_empty());
        assert_eq!(first_map, second_map);
    }

    #[test]
    fn test_detect_changes_single_character_mutation() {
        let docs = vec![document("a.txt", "alpha"), document("b.txt", "beta")];
        let (_, map) = detect_changes(&docs, &FingerprintMap::default());

        let mutated = vec![document("a.txt", "alpha"), document("b.txt", "betA")];
        let (to_process, _) = detect_changes(&mutated, &map);

        assert_eq!(to_process.len(), 1);
        assert_eq!(to_process[0].id, "b.txt");
    }

    #[test]
    fn test_detect_changes_removed_document_drops_from_map() {
        let docs = vec![document("a.txt", "alpha"), document("b.txt", "beta")];
        let (_, map) = detect_changes(&docs, &FingerprintMap::default());

        let remaining = vec![document("a.txt", "alpha")];
        let (to_process, updated) = detect_changes(&remaining, &map);

        assert!(to_process.is_empty());
        assert_eq!(updated.len(), 1);
        assert!(updated.get("b.txt").is_none());
    }

    #[test]
    fn test_detect_changes_empty_corpus() {
        let (to_process, updated) = detect_changes(&[], &FingerprintMap::default());
        assert!(to_process.is_empty());
        assert!(updated.is_empty());
    }

    #[test]
    fn test_persist_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");

        let docs = vec![document("a.txt", "alpha")];
        let (_, map) = detect_changes(&docs, &FingerprintMap::default());
        map.persist(&path).unwrap();

        let loaded = FingerprintMap::load(&path);
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_persisted_format_is_flat_object() {
        let mut map = FingerprintMap::default();
        map.insert("doc.txt".to_string(), "abc123".to_string());

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["doc.txt"], "abc123");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = FingerprintMap::load(&dir.path().join("nope.json"));
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");
        std::fs::write(&path, "{not json").unwrap();

        let loaded = FingerprintMap::load(&path);
        assert!(loaded.is_empty());
    }
}
