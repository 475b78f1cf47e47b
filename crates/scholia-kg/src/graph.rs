//! Consolidated knowledge-graph snapshot model.
//!
//! The snapshot is a plain serde tree matching the on-disk JSON exactly:
//! five typed node collections, a flat relationship list, and aggregate
//! counters that are recomputed — never incremented — after every mutation.
//! Mutations are pure functions over the in-memory snapshot; persistence
//! lives in `consolidator`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use scholia_common::metadata::{AcademicMetadata, Author, EquationType, Reference};

pub const SNAPSHOT_VERSION: &str = "2.0.0";

// ---------------------------------------------------------------------------
// Snapshot structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    pub created: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub title: String,
    pub metadata: PaperNodeMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperNodeMeta {
    pub authors: Vec<Author>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub identifier: Option<String>,
    pub identifier_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquationNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub raw_text: String,
    pub metadata: EquationNodeMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquationNodeMeta {
    pub symbols: Vec<String>,
    pub equation_type: EquationType,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub text: String,
    pub metadata: CitationNodeMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationNodeMeta {
    pub context: String,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSet {
    pub papers: Vec<PaperNode>,
    pub equations: Vec<EquationNode>,
    pub citations: Vec<CitationNode>,
    pub authors: Vec<AuthorNode>,
    /// Reserved collection; always serialized, currently unpopulated.
    pub contexts: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    WrittenBy,
    ContainsEquation,
    ContainsCitation,
    CitesPaper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_documents: usize,
    pub total_equations: usize,
    pub total_citations: usize,
    pub total_relationships: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub store_info: StoreInfo,
    pub nodes: NodeSet,
    pub relationships: Vec<Relationship>,
    pub global_stats: GlobalStats,
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// A mutation over the snapshot. Applying a mutation is pure in-memory work;
/// callers decide when the result is persisted.
#[derive(Debug, Clone)]
pub enum GraphMutation {
    UpsertDocument {
        doc_id: String,
        metadata: AcademicMetadata,
    },
    RemoveDocument {
        doc_id: String,
    },
}

impl KnowledgeGraph {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_info: StoreInfo {
                name: store_name.into(),
                created: Utc::now(),
                last_updated: None,
                version: SNAPSHOT_VERSION.to_string(),
            },
            nodes: NodeSet::default(),
            relationships: Vec::new(),
            global_stats: GlobalStats::default(),
        }
    }

    /// Apply a mutation, recompute stats, and stamp the update time.
    pub fn apply(&mut self, mutation: &GraphMutation) {
        match mutation {
            GraphMutation::UpsertDocument { doc_id, metadata } => {
                self.upsert_document(doc_id, metadata)
            }
            GraphMutation::RemoveDocument { doc_id } => self.remove_document(doc_id),
        }
        self.recompute_stats();
        self.store_info.last_updated = Some(Utc::now());
    }

    /// Counters always equal `len()` of the backing collections.
    pub fn recompute_stats(&mut self) {
        self.global_stats = GlobalStats {
            total_documents: self.nodes.papers.len(),
            total_equations: self.nodes.equations.len(),
            total_citations: self.nodes.citations.len(),
            total_relationships: self.relationships.len(),
        };
    }

    fn upsert_document(&mut self, doc_id: &str, metadata: &AcademicMetadata) {
        // Stale document-scoped nodes and edges must go first so re-adding a
        // document cannot duplicate its scoped nodes.
        self.strip_document_scope(doc_id);

        let paper = PaperNode {
            id: doc_id.to_string(),
            node_type: "paper".to_string(),
            title: metadata.title.clone(),
            metadata: PaperNodeMeta {
                authors: metadata.authors.clone(),
                year: metadata.year,
                venue: metadata.journal.clone(),
                identifier: metadata.identifier.clone(),
                identifier_type: metadata.identifier_type.clone(),
            },
        };
        match self.nodes.papers.iter_mut().find(|p| p.id == doc_id) {
            Some(existing) => *existing = paper,
            None => self.nodes.papers.push(paper),
        }

        // Author nodes are keyed by full name and may coalesce across
        // documents; duplicates are tolerated, not deduplicated here.
        for author in &metadata.authors {
            let name = author.display_name().to_string();
            if name.is_empty() {
                continue;
            }
            self.nodes.authors.push(AuthorNode {
                id: name.clone(),
                node_type: "author".to_string(),
                name: name.clone(),
                metadata: serde_json::Map::new(),
            });
            self.relationships.push(Relationship {
                source: doc_id.to_string(),
                target: name,
                rel_type: RelationType::WrittenBy,
                metadata: json!({}),
            });
        }

        for (i, equation) in metadata.equations.iter().enumerate() {
            let node_id = format!("{}_eq_{}", doc_id, i);
            self.nodes.equations.push(EquationNode {
                id: node_id.clone(),
                node_type: "equation".to_string(),
                raw_text: equation.raw_text.clone(),
                metadata: EquationNodeMeta {
                    symbols: equation.symbols.iter().cloned().collect(),
                    equation_type: equation.equation_type,
                    context: equation.context.clone(),
                },
            });
            self.relationships.push(Relationship {
                source: doc_id.to_string(),
                target: node_id,
                rel_type: RelationType::ContainsEquation,
                metadata: json!({}),
            });
        }

        for (i, citation) in metadata.citations.iter().enumerate() {
            let node_id = format!("{}_cite_{}", doc_id, i);
            self.nodes.citations.push(CitationNode {
                id: node_id.clone(),
                node_type: "citation".to_string(),
                text: citation.text.clone(),
                metadata: CitationNodeMeta {
                    context: citation.context.clone(),
                    references: citation.references.clone(),
                },
            });
            self.relationships.push(Relationship {
                source: doc_id.to_string(),
                target: node_id.clone(),
                rel_type: RelationType::ContainsCitation,
                metadata: json!({}),
            });
            for reference in &citation.references {
                // Titled references resolved through the bibliographic parser
                // carry more certainty than bare raw-text matches.
                let confidence = if reference.title.is_some() { 1.0 } else { 0.8 };
                self.relationships.push(Relationship {
                    source: node_id.clone(),
                    target: reference.display_title().to_string(),
                    rel_type: RelationType::CitesPaper,
                    metadata: json!({ "confidence": confidence }),
                });
            }
        }

        debug!(doc_id, "document upserted into graph");
    }

    fn remove_document(&mut self, doc_id: &str) {
        self.nodes.papers.retain(|p| p.id != doc_id);
        self.strip_document_scope(doc_id);
        debug!(doc_id, "document removed from graph");
    }

    /// Remove every node and relationship scoped to `doc_id`: equation and
    /// citation nodes carrying the document prefix, relationships whose
    /// source or target is the document or carries its prefix, and one
    /// author node per retired `written_by` edge. Upserting appends one
    /// author node per edge, so retiring one per edge keeps the collections
    /// balanced and makes add-then-remove restore counts exactly.
    fn strip_document_scope(&mut self, doc_id: &str) {
        let eq_prefix = format!("{}_eq_", doc_id);
        let cite_prefix = format!("{}_cite_", doc_id);
        self.nodes.equations.retain(|n| !n.id.starts_with(&eq_prefix));
        self.nodes.citations.retain(|n| !n.id.starts_with(&cite_prefix));

        let involves_doc = |id: &str| id == doc_id || id.starts_with(doc_id);
        let mut retired_authors: Vec<String> = Vec::new();
        self.relationships.retain(|r| {
            let removing = involves_doc(&r.source) || involves_doc(&r.target);
            if removing && r.rel_type == RelationType::WrittenBy {
                retired_authors.push(r.target.clone());
            }
            !removing
        });

        for author_id in retired_authors {
            if let Some(pos) = self.nodes.authors.iter().position(|a| a.id == author_id) {
                self.nodes.authors.remove(pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_common::metadata::{Citation, Equation};

    fn sample_metadata(doc_id: &str) -> AcademicMetadata {
        AcademicMetadata {
            doc_id: doc_id.to_string(),
            title: "Sample".to_string(),
            authors: vec![Author::from_full_name("Jane Smith")],
            equations: vec![
                Equation {
                    id: "eq1".into(),
                    raw_text: "a + b".into(),
                    ..Default::default()
                },
                Equation {
                    id: "eq2".into(),
                    raw_text: "c * d".into(),
                    ..Default::default()
                },
            ],
            citations: vec![Citation {
                text: "[1]".into(),
                references: vec![Reference {
                    raw_text: "Old work".into(),
                    title: Some("Old work".into()),
                    ..Default::default()
                }],
                context: "see [1]".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_stats_match_collection_lengths_after_every_mutation() {
        let mut graph = KnowledgeGraph::new("store");
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata: sample_metadata("d1"),
        });
        assert_eq!(graph.global_stats.total_documents, graph.nodes.papers.len());
        assert_eq!(graph.global_stats.total_equations, graph.nodes.equations.len());
        assert_eq!(graph.global_stats.total_citations, graph.nodes.citations.len());
        assert_eq!(
            graph.global_stats.total_relationships,
            graph.relationships.len()
        );

        graph.apply(&GraphMutation::RemoveDocument { doc_id: "d1".into() });
        assert_eq!(graph.global_stats, GlobalStats::default());
    }

    #[test]
    fn test_add_then_remove_restores_prior_counts() {
        let mut graph = KnowledgeGraph::new("store");
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata: sample_metadata("d1"),
        });
        let before = (
            graph.nodes.papers.len(),
            graph.nodes.equations.len(),
            graph.nodes.citations.len(),
            graph.nodes.authors.len(),
            graph.relationships.len(),
            graph.global_stats,
        );

        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d2".into(),
            metadata: sample_metadata("d2"),
        });
        graph.apply(&GraphMutation::RemoveDocument { doc_id: "d2".into() });

        let after = (
            graph.nodes.papers.len(),
            graph.nodes.equations.len(),
            graph.nodes.citations.len(),
            graph.nodes.authors.len(),
            graph.relationships.len(),
            graph.global_stats,
        );
        assert_eq!(before, after);
    }

    #[test]
    fn test_removal_cascades_to_scoped_nodes_and_edges() {
        let mut graph = KnowledgeGraph::new("store");
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata: sample_metadata("d1"),
        });
        graph.apply(&GraphMutation::RemoveDocument { doc_id: "d1".into() });

        assert!(graph.nodes.equations.iter().all(|n| !n.id.starts_with("d1")));
        assert!(graph.nodes.citations.iter().all(|n| !n.id.starts_with("d1")));
        assert!(graph
            .relationships
            .iter()
            .all(|r| !r.source.starts_with("d1") && !r.target.starts_with("d1")));
    }

    #[test]
    fn test_upsert_replaces_paper_without_duplicating_scoped_nodes() {
        let mut graph = KnowledgeGraph::new("store");
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata: sample_metadata("d1"),
        });
        let mut updated = sample_metadata("d1");
        updated.title = "Sample, revised".to_string();
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata: updated,
        });

        assert_eq!(graph.nodes.papers.len(), 1);
        assert_eq!(graph.nodes.papers[0].title, "Sample, revised");
        assert_eq!(graph.nodes.equations.len(), 2);
        assert_eq!(graph.nodes.citations.len(), 1);
    }

    #[test]
    fn test_shared_author_survives_partial_removal() {
        let mut graph = KnowledgeGraph::new("store");
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata: sample_metadata("d1"),
        });
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d2".into(),
            metadata: sample_metadata("d2"),
        });
        // Both documents list Jane Smith; removing one keeps her other edge.
        graph.apply(&GraphMutation::RemoveDocument { doc_id: "d2".into() });
        assert!(graph
            .relationships
            .iter()
            .any(|r| r.rel_type == RelationType::WrittenBy && r.target == "Jane Smith"));
        assert_eq!(
            graph
                .nodes
                .authors
                .iter()
                .filter(|a| a.id == "Jane Smith")
                .count(),
            1
        );
    }

    #[test]
    fn test_cites_paper_confidence_reflects_titled_reference() {
        let mut graph = KnowledgeGraph::new("store");
        let mut metadata = sample_metadata("d1");
        metadata.citations.push(Citation {
            text: "[2]".into(),
            references: vec![Reference {
                raw_text: "Untitled raw reference".into(),
                ..Default::default()
            }],
            context: String::new(),
        });
        graph.apply(&GraphMutation::UpsertDocument {
            doc_id: "d1".into(),
            metadata,
        });

        let confidences: Vec<f64> = graph
            .relationships
            .iter()
            .filter(|r| r.rel_type == RelationType::CitesPaper)
            .map(|r| r.metadata["confidence"].as_f64().unwrap())
            .collect();
        assert!(confidences.contains(&1.0));
        assert!(confidences.contains(&0.8));
    }
}
