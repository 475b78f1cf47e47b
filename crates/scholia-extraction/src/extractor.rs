//! Per-document extraction orchestrator.
//!
//! Builds one `AcademicMetadata` from raw document text, reusing
//! authoritative external metadata when present and filling the gaps from
//! heuristics. Extraction favours availability over strictness: a document
//! with nothing extractable still produces a valid, mostly-empty record.

use tracing::{debug, warn};

use scholia_common::metadata::AcademicMetadata;

use crate::citations::CitationProcessor;
use crate::equations::EquationExtractor;
use crate::heuristics::{LayoutHeuristicClassifier, TextHeuristicClassifier};
use crate::refparse::{locate_references_section, ReferenceParser};

pub struct MetadataExtractor {
    classifier: Box<dyn TextHeuristicClassifier>,
    equation_extractor: EquationExtractor,
    reference_parser: ReferenceParser,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(ReferenceParser::default())
    }
}

impl MetadataExtractor {
    pub fn new(reference_parser: ReferenceParser) -> Self {
        Self {
            classifier: Box::new(LayoutHeuristicClassifier::new()),
            equation_extractor: EquationExtractor::new(),
            reference_parser,
        }
    }

    /// Swap the front-matter cascade for another classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn TextHeuristicClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Extract metadata from document text, reusing `existing` fields where
    /// they came from an authoritative source (arxiv/crossref).
    pub fn extract(
        &self,
        text: &str,
        doc_id: &str,
        existing: Option<AcademicMetadata>,
    ) -> AcademicMetadata {
        let mut metadata = existing.unwrap_or_else(|| AcademicMetadata::new(doc_id));
        metadata.doc_id = doc_id.to_string();

        if metadata.has_authoritative_source() {
            debug!(
                doc_id,
                source = metadata.source.as_deref().unwrap_or_default(),
                "reusing authoritative metadata"
            );
        } else {
            let lines: Vec<&str> = text.lines().collect();
            let front = self.classifier.classify(&lines);
            if metadata.title.is_empty() {
                match front.title {
                    Some(title) => metadata.title = title,
                    None => warn!(doc_id, "no title detected"),
                }
            }
            if metadata.authors.is_empty() {
                if front.authors.is_empty() {
                    warn!(doc_id, "no authors detected");
                }
                metadata.authors = front.authors;
            }
            if metadata.abstract_text.is_empty() {
                metadata.abstract_text = front.abstract_text.unwrap_or_default();
            }
            if metadata.source.is_none() {
                metadata.source = Some("heuristic-text".to_string());
            }
        }

        if metadata.equations.is_empty() {
            metadata.equations = self.equation_extractor.extract_equations(text);
        }

        if metadata.references.is_empty() {
            metadata.references = match locate_references_section(text) {
                Some(section) => match self.reference_parser.parse_references(section) {
                    Ok(references) => references,
                    Err(e) => {
                        warn!(doc_id, error = %e, "reference parsing failed");
                        Vec::new()
                    }
                },
                None => {
                    debug!(doc_id, "no references section found");
                    Vec::new()
                }
            };
        }

        if metadata.citations.is_empty() {
            let mut processor = CitationProcessor::new(metadata.references.clone());
            metadata.citations = processor
                .process_citations(text)
                .iter()
                .map(|link| link.to_citation())
                .collect();
        }

        metadata
    }
}
