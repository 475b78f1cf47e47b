//! Snapshot persistence for the consolidated knowledge graph.
//!
//! The consolidator owns the load → apply → rewrite cycle for one store.
//! A `Mutex` serializes mutations from concurrent worker threads; there is
//! no cross-process locking, so concurrent external writers of the same
//! snapshot file must be avoided by the caller. Persistence failures are
//! propagated to the caller — a failed write means the mutation did not
//! happen, and the caller may retry.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use scholia_common::error::{Result, ScholiaError};
use scholia_common::metadata::AcademicMetadata;

use crate::graph::{GraphMutation, KnowledgeGraph};

const SNAPSHOT_FILE: &str = "consolidated_metadata.json";

/// Manages the consolidated knowledge graph for one document store.
pub struct MetadataConsolidator {
    store_path: PathBuf,
    snapshot_path: PathBuf,
    lock: Mutex<()>,
}

impl MetadataConsolidator {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        let snapshot_path = store_path.join(SNAPSHOT_FILE);
        Self {
            store_path,
            snapshot_path,
            lock: Mutex::new(()),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// A poisoned lock is recovered rather than propagated: the guard
    /// protects no in-memory state, and the snapshot on disk is always
    /// consistent thanks to the atomic rewrite.
    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a fresh, empty snapshot (idempotent: an existing snapshot is
    /// left untouched).
    pub fn initialize(&self) -> Result<()> {
        let _guard = self.guard();
        if self.snapshot_path.exists() {
            return Ok(());
        }
        let graph = self.fresh_graph();
        self.save_graph(&graph)?;
        info!(path = %self.snapshot_path.display(), "initialized consolidated snapshot");
        Ok(())
    }

    /// Merge one document's metadata into the graph.
    pub fn update_document_metadata(
        &self,
        doc_id: &str,
        metadata: &AcademicMetadata,
    ) -> Result<()> {
        self.apply(GraphMutation::UpsertDocument {
            doc_id: doc_id.to_string(),
            metadata: metadata.clone(),
        })
    }

    /// Remove one document and everything scoped to it.
    pub fn remove_document_metadata(&self, doc_id: &str) -> Result<()> {
        self.apply(GraphMutation::RemoveDocument {
            doc_id: doc_id.to_string(),
        })
    }

    /// Serialized load → apply → atomic rewrite.
    pub fn apply(&self, mutation: GraphMutation) -> Result<()> {
        let _guard = self.guard();
        let mut graph = self.load_graph_unlocked()?;
        graph.apply(&mutation);
        self.save_graph(&graph)?;
        debug!(path = %self.snapshot_path.display(), "snapshot rewritten");
        Ok(())
    }

    /// Read the current snapshot; a missing file yields a fresh graph.
    pub fn load_graph(&self) -> Result<KnowledgeGraph> {
        let _guard = self.guard();
        self.load_graph_unlocked()
    }

    /// Write one document's metadata file (`{doc_id}_metadata.json`).
    pub fn write_document_metadata(
        &self,
        doc_id: &str,
        metadata: &AcademicMetadata,
    ) -> Result<PathBuf> {
        let path = self.store_path.join(format!("{}_metadata.json", doc_id));
        fs::create_dir_all(&self.store_path)?;
        fs::write(&path, serde_json::to_vec_pretty(metadata)?)?;
        Ok(path)
    }

    /// Read one document's metadata file back.
    pub fn read_document_metadata(&self, doc_id: &str) -> Result<AcademicMetadata> {
        let path = self.store_path.join(format!("{}_metadata.json", doc_id));
        let raw = fs::read(&path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn fresh_graph(&self) -> KnowledgeGraph {
        let name = self
            .store_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("store");
        KnowledgeGraph::new(name)
    }

    fn load_graph_unlocked(&self) -> Result<KnowledgeGraph> {
        if !self.snapshot_path.exists() {
            warn!(path = %self.snapshot_path.display(), "no snapshot on disk; starting fresh");
            return Ok(self.fresh_graph());
        }
        let raw = fs::read(&self.snapshot_path)?;
        serde_json::from_slice(&raw).map_err(|e| {
            ScholiaError::Store(format!(
                "corrupt snapshot at {}: {}",
                self.snapshot_path.display(),
                e
            ))
        })
    }

    /// Atomic rewrite: serialize to a temp file in the store directory, then
    /// rename over the snapshot — a crashed writer cannot leave a torn file.
    fn save_graph(&self, graph: &KnowledgeGraph) -> Result<()> {
        fs::create_dir_all(&self.store_path)?;
        let tmp = tempfile::NamedTempFile::new_in(&self.store_path)?;
        serde_json::to_writer_pretty(&tmp, graph)?;
        tmp.persist(&self.snapshot_path)
            .map_err(|e| ScholiaError::Store(format!("snapshot rename failed: {}", e.error)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_common::metadata::Author;

    fn metadata(doc_id: &str) -> AcademicMetadata {
        AcademicMetadata {
            doc_id: doc_id.to_string(),
            title: format!("Paper {}", doc_id),
            authors: vec![Author::from_full_name("Jane Smith")],
            ..Default::default()
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let consolidator = MetadataConsolidator::new(dir.path());
        consolidator.initialize().unwrap();
        consolidator
            .update_document_metadata("d1", &metadata("d1"))
            .unwrap();
        consolidator.initialize().unwrap();
        let graph = consolidator.load_graph().unwrap();
        assert_eq!(graph.global_stats.total_documents, 1);
    }

    #[test]
    fn test_update_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let consolidator = MetadataConsolidator::new(dir.path());
            consolidator
                .update_document_metadata("d1", &metadata("d1"))
                .unwrap();
        }
        let reopened = MetadataConsolidator::new(dir.path());
        let graph = reopened.load_graph().unwrap();
        assert_eq!(graph.nodes.papers.len(), 1);
        assert_eq!(graph.nodes.papers[0].title, "Paper d1");
        assert!(graph.store_info.last_updated.is_some());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_explicit_error() {
        let dir = tempfile::tempdir().unwrap();
        let consolidator = MetadataConsolidator::new(dir.path());
        fs::write(consolidator.snapshot_path(), b"{ not json").unwrap();
        let err = consolidator.load_graph().unwrap_err();
        assert!(matches!(err, ScholiaError::Store(_)));
    }

    #[test]
    fn test_document_metadata_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let consolidator = MetadataConsolidator::new(dir.path());
        let original = metadata("d1");
        let path = consolidator.write_document_metadata("d1", &original).unwrap();
        assert!(path.ends_with("d1_metadata.json"));
        let loaded = consolidator.read_document_metadata("d1").unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let consolidator = std::sync::Arc::new(MetadataConsolidator::new(dir.path()));
        let poisoner = consolidator.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock.lock().unwrap();
            panic!("holding the consolidator lock");
        })
        .join();

        consolidator
            .update_document_metadata("d1", &metadata("d1"))
            .unwrap();
        let graph = consolidator.load_graph().unwrap();
        assert_eq!(graph.global_stats.total_documents, 1);
    }

    #[test]
    fn test_concurrent_updates_serialize_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let consolidator = std::sync::Arc::new(MetadataConsolidator::new(dir.path()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let consolidator = consolidator.clone();
                std::thread::spawn(move || {
                    let doc_id = format!("d{}", i);
                    consolidator
                        .update_document_metadata(&doc_id, &metadata(&doc_id))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let graph = consolidator.load_graph().unwrap();
        assert_eq!(graph.global_stats.total_documents, 8);
        assert_eq!(graph.global_stats.total_relationships, 8);
    }
}
