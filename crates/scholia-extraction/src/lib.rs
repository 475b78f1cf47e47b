//! scholia-extraction — Scholarly metadata extraction from plain text.
//! Covers:
//! - Equation detection and symbol extraction
//! - In-text citation detection and reference resolution
//! - External reference-parser integration (subprocess)
//! - Front-matter heuristics (title / authors / abstract)
//! - The per-document extraction orchestrator

pub mod equations;
pub mod citations;
pub mod refparse;
pub mod heuristics;
pub mod extractor;

pub use citations::{CitationLink, CitationLocation, CitationProcessor};
pub use equations::EquationExtractor;
pub use extractor::MetadataExtractor;
pub use heuristics::{FrontMatter, LayoutHeuristicClassifier, TextHeuristicClassifier};
pub use refparse::ReferenceParser;
