//! scholia-kg — Consolidated knowledge graph across a document store.
//!
//! `graph` holds the versioned snapshot model and the pure mutation logic;
//! `consolidator` owns persistence: load snapshot → apply mutation → atomic
//! rewrite, serialized under a lock.

pub mod graph;
pub mod consolidator;

pub use consolidator::MetadataConsolidator;
pub use graph::{GraphMutation, KnowledgeGraph, RelationType, Relationship};
