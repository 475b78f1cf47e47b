//! Structural validation for metadata records and document content.
//!
//! Errors block downstream use; warnings are informational. Extraction
//! itself never raises — validation is the explicit gate callers run before
//! consolidating a record.

use serde::{Deserialize, Serialize};

use crate::metadata::{AcademicMetadata, Reference};

/// How strict validation should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    #[default]
    Basic,
    /// Additionally flags missing bibliographic detail (e.g. no DOI).
    Strict,
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Minimum word count for document content to be worth processing.
const MIN_CONTENT_WORDS: usize = 10;

/// Validate a single reference record.
pub fn validate_reference(reference: &Reference, level: ValidationLevel) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if reference.raw_text.trim().is_empty() {
        errors.push("reference raw text is empty".to_string());
    }
    if reference.title.is_none() {
        warnings.push("reference has no title".to_string());
    }
    if level == ValidationLevel::Strict && reference.doi.is_none() {
        warnings.push("reference has no DOI".to_string());
    }

    ValidationReport::from_parts(errors, warnings)
}

/// Validate document text before extraction or insertion.
pub fn validate_content(content: &str) -> ValidationReport {
    let mut errors = Vec::new();

    if content.trim().is_empty() {
        errors.push("content is empty".to_string());
    } else if content.split_whitespace().count() < MIN_CONTENT_WORDS {
        errors.push(format!(
            "content too short (minimum {} words)",
            MIN_CONTENT_WORDS
        ));
    }

    ValidationReport::from_parts(errors, Vec::new())
}

/// Validate a full metadata record before consolidation.
pub fn validate_metadata(metadata: &AcademicMetadata, level: ValidationLevel) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if metadata.doc_id.trim().is_empty() {
        errors.push("doc_id is empty".to_string());
    }
    if metadata.title.trim().is_empty() {
        warnings.push("document has no title".to_string());
    }
    if metadata.authors.is_empty() {
        warnings.push("document has no authors".to_string());
    }

    for (i, reference) in metadata.references.iter().enumerate() {
        let report = validate_reference(reference, level);
        errors.extend(
            report
                .errors
                .into_iter()
                .map(|e| format!("reference[{}]: {}", i, e)),
        );
        warnings.extend(
            report
                .warnings
                .into_iter()
                .map(|w| format!("reference[{}]: {}", i, w)),
        );
    }

    ValidationReport::from_parts(errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reference_text_is_an_error() {
        let reference = Reference::default();
        let report = validate_reference(&reference, ValidationLevel::Basic);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_missing_doi_warns_only_under_strict() {
        let reference = Reference {
            raw_text: "Smith, J. (2023). A paper. Journal.".into(),
            title: Some("A paper".into()),
            ..Default::default()
        };
        let basic = validate_reference(&reference, ValidationLevel::Basic);
        assert!(basic.is_valid);
        assert!(basic.warnings.is_empty());

        let strict = validate_reference(&reference, ValidationLevel::Strict);
        assert!(strict.is_valid);
        assert!(strict.warnings.iter().any(|w| w.contains("DOI")));
    }

    #[test]
    fn test_short_content_is_rejected() {
        assert!(!validate_content("too short").is_valid);
        assert!(!validate_content("   ").is_valid);
        let ok = "one two three four five six seven eight nine ten";
        assert!(validate_content(ok).is_valid);
    }

    #[test]
    fn test_metadata_without_doc_id_is_invalid() {
        let metadata = AcademicMetadata::default();
        let report = validate_metadata(&metadata, ValidationLevel::Basic);
        assert!(!report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("title")));
    }
}
