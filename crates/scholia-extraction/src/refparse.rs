//! External bibliographic parser integration.
//!
//! The parser is a command-line tool invoked as `<command> parse <file>`,
//! producing a JSON array of CSL-like records:
//! `{ original, title, author: [{given, family}], date, doi, container-title }`.
//! Absence of the tool is a soft failure: the document is still processed,
//! just with an empty reference list.

use std::io::Write;
use std::process::Command;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use scholia_common::error::Result;
use scholia_common::metadata::{Author, Reference};

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
    /// Section headings that introduce the bibliography.
    static ref REFERENCES_HEADING_RE: Regex =
        Regex::new(r"(?mi)^\s*(?:#+\s*)?(?:\d+\.?\s*)?(references|bibliography|works cited)\s*$")
            .unwrap();
}

/// Client for the external reference parser subprocess.
#[derive(Debug, Clone)]
pub struct ReferenceParser {
    command: String,
}

impl Default for ReferenceParser {
    fn default() -> Self {
        Self::new("anystyle")
    }
}

impl ReferenceParser {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Parse a references section into structured records.
    ///
    /// Degrades to an empty list (with a warning) when the tool is missing,
    /// exits non-zero, or emits something other than a JSON array. The
    /// subprocess itself is unbounded here; callers needing a timeout must
    /// enforce it around this call.
    pub fn parse_references(&self, references_section: &str) -> Result<Vec<Reference>> {
        let mut input = tempfile::NamedTempFile::new()?;
        input.write_all(references_section.as_bytes())?;
        input.flush()?;

        let output = match Command::new(&self.command)
            .arg("parse")
            .arg(input.path())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(command = %self.command, "reference parser not installed; skipping references");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            warn!(
                command = %self.command,
                status = %output.status,
                "reference parser exited non-zero; skipping references"
            );
            return Ok(Vec::new());
        }

        let records: serde_json::Value = match serde_json::from_slice(&output.stdout) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "reference parser produced malformed JSON; skipping references");
                return Ok(Vec::new());
            }
        };

        let references: Vec<Reference> = records
            .as_array()
            .map(|items| items.iter().map(record_to_reference).collect())
            .unwrap_or_default();
        debug!(n = references.len(), "parsed references");
        Ok(references)
    }
}

/// Locate the bibliography section of a document: everything after the last
/// references/bibliography heading.
pub fn locate_references_section(text: &str) -> Option<&str> {
    let m = REFERENCES_HEADING_RE.find_iter(text).last()?;
    let tail = text[m.end()..].trim();
    (!tail.is_empty()).then_some(tail)
}

// ── Conversion ─────────────────────────────────────────────────────────────

/// Single-string-or-array fields are common in CSL output.
fn string_or_first(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(String::from)
        .or_else(|| {
            value
                .as_array()
                .and_then(|a| a.first())
                .and_then(|v| v.as_str())
                .map(String::from)
        })
        .filter(|s| !s.trim().is_empty())
}

fn record_to_reference(record: &serde_json::Value) -> Reference {
    let title = string_or_first(&record["title"]);
    let doi = string_or_first(&record["doi"]);
    let venue = string_or_first(&record["container-title"]);

    let year = string_or_first(&record["date"])
        .and_then(|date| YEAR_RE.captures(&date).map(|c| c[1].to_string()))
        .and_then(|y| y.parse().ok());

    let authors: Vec<Author> = record["author"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|entry| {
                    let given = entry["given"].as_str().unwrap_or("");
                    let family = entry["family"].as_str().unwrap_or("");
                    if given.is_empty() && family.is_empty() {
                        entry["literal"].as_str().map(Author::from_full_name)
                    } else {
                        Some(Author::from_parts(given, family))
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let raw_text = string_or_first(&record["original"])
        .or_else(|| title.clone())
        .unwrap_or_default();

    Reference {
        raw_text,
        title,
        authors,
        year,
        doi,
        venue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_to_reference_maps_csl_fields() {
        let record = json!({
            "original": "Smith, J. and Doe, A. Deep graphs. JMLR, 2023.",
            "title": ["Deep graphs"],
            "author": [
                {"given": "Jane", "family": "Smith"},
                {"given": "Alex", "family": "Doe"}
            ],
            "date": ["2023-01"],
            "doi": "10.1000/dg",
            "container-title": ["JMLR"]
        });
        let reference = record_to_reference(&record);
        assert_eq!(reference.title.as_deref(), Some("Deep graphs"));
        assert_eq!(reference.year, Some(2023));
        assert_eq!(reference.doi.as_deref(), Some("10.1000/dg"));
        assert_eq!(reference.venue.as_deref(), Some("JMLR"));
        assert_eq!(reference.authors.len(), 2);
        assert_eq!(reference.authors[0].last_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_missing_fields_default() {
        let reference = record_to_reference(&json!({"title": "Untracked note"}));
        assert_eq!(reference.raw_text, "Untracked note");
        assert_eq!(reference.year, None);
        assert!(reference.authors.is_empty());
    }

    #[test]
    fn test_missing_tool_degrades_to_empty_list() {
        let parser = ReferenceParser::new("definitely-not-a-real-binary-7f3a");
        let references = parser.parse_references("[1] Smith 2023.").unwrap();
        assert!(references.is_empty());
    }

    #[test]
    fn test_locate_references_section() {
        let text = "Body text.\n\nReferences\n[1] Smith, J. (2023).\n[2] Doe, A. (2021).";
        let section = locate_references_section(text).unwrap();
        assert!(section.starts_with("[1] Smith"));
        assert!(locate_references_section("No bibliography here.").is_none());
    }
}
