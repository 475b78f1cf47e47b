//! Core scholarly metadata types.
//! These are the Rust representations of the per-document metadata JSON
//! (`{doc_id}_metadata.json`) and the building blocks of the consolidated
//! knowledge graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub affiliation: Option<String>,
    pub email: Option<String>,
}

impl Author {
    /// Build an author from a single display name.
    /// The last name is the final whitespace token; a single-token name
    /// is its own last name.
    pub fn from_full_name(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let parts: Vec<&str> = full_name.split_whitespace().collect();
        let (first_name, last_name) = match parts.as_slice() {
            [] => (None, None),
            [only] => (None, Some((*only).to_string())),
            [given @ .., family] => (Some(given.join(" ")), Some((*family).to_string())),
        };
        Self {
            full_name: Some(full_name),
            first_name,
            last_name,
            affiliation: None,
            email: None,
        }
    }

    /// Build an author from given/family parts (CSL-style records).
    pub fn from_parts(given: &str, family: &str) -> Self {
        let given = given.trim();
        let family = family.trim();
        let full_name = if given.is_empty() {
            family.to_string()
        } else {
            format!("{} {}", given, family)
        };
        Self {
            full_name: Some(full_name),
            first_name: (!given.is_empty()).then(|| given.to_string()),
            last_name: (!family.is_empty()).then(|| family.to_string()),
            affiliation: None,
            email: None,
        }
    }

    /// Display name, preferring the full name.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.last_name.as_deref())
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// A reference to another academic work. Identity is structural: references
/// carry no external ID and are compared by content during resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub raw_text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl Reference {
    /// Title when known, raw text otherwise. Used as the `cites_paper`
    /// relationship target and as the citation-graph key.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.raw_text)
    }
}

// ---------------------------------------------------------------------------
// Equation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquationType {
    #[default]
    Inline,
    Display,
    Definition,
    Theorem,
}

/// A mathematical expression found in document text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// Generated identifier, monotonic per extraction run (`eq1`, `eq2`, ...).
    pub id: String,
    pub raw_text: String,
    #[serde(default)]
    pub equation_type: EquationType,
    /// Surrounding lines of the source text.
    #[serde(default)]
    pub context: Option<String>,
    /// Symbol tokens referenced by the equation. An ordered set keeps the
    /// JSON serialization deterministic.
    #[serde(default)]
    pub symbols: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Citation
// ---------------------------------------------------------------------------

/// An in-text citation occurrence with its resolved references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub context: String,
}

// ---------------------------------------------------------------------------
// AcademicMetadata
// ---------------------------------------------------------------------------

/// The aggregate metadata record for one document. Created once per document
/// at extraction time, consumed exactly once by the consolidator, and never
/// mutated in place afterward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicMetadata {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub equations: Vec<Equation>,
    /// DOI or arXiv identifier.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Identifier kind: "doi" | "arxiv".
    #[serde(default)]
    pub identifier_type: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub journal: Option<String>,
    /// Metadata provenance tag: "arxiv" | "crossref" | "heuristic-text".
    #[serde(default)]
    pub source: Option<String>,
}

impl AcademicMetadata {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            ..Default::default()
        }
    }

    /// True when the record came from an authoritative external source and
    /// should be reused as-is rather than re-derived from text.
    pub fn has_authoritative_source(&self) -> bool {
        matches!(self.source.as_deref(), Some("arxiv") | Some("crossref"))
    }
}
