//! In-text citation detection and resolution against a reference list.
//!
//! Three citation-style families are evaluated in strict priority order:
//! cross-reference (`cf. Smith et al. (2023)`) → numeric (`[1]`, `[1,2]`,
//! `[1-3]`) → author-year (`Smith et al. (2023)`, `Smith and Jones (2023)`).
//! The order is load-bearing: spans matched by the cross-reference pass are
//! recorded, and any author-year match overlapping a claimed span is skipped
//! so the same text is never counted twice.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use scholia_common::metadata::{Citation, Reference};

lazy_static! {
    static ref CROSS_REF_RE: Regex = Regex::new(
        r"(?:^|[^\w.])(cf\.\s+([A-Z][a-z]+)(?:\s+et\s+al\.)?\s*\((\d{4})\))"
    )
    .unwrap();

    /// Bare `Name (Year)`, optionally with `et al.`.
    static ref AUTHOR_YEAR_RE: Regex = Regex::new(
        r"(?:^|[^\w.])(([A-Z][a-z]+)(?:\s+et\s+al\.)?\s*\((\d{4})\))"
    )
    .unwrap();

    /// `First and Second (Year)` resolving by the first author.
    static ref TWO_AUTHOR_FIRST_RE: Regex = Regex::new(
        r"(?:^|[^\w.])(([A-Z][a-z]+)\s+(?:and|&)\s+[A-Z][a-z]+\s*\((\d{4})\))"
    )
    .unwrap();

    /// `First and Second (Year)` resolving by the second author.
    static ref TWO_AUTHOR_SECOND_RE: Regex = Regex::new(
        r"(?:^|[^\w.])([A-Z][a-z]+\s+(?:and|&)\s+([A-Z][a-z]+)\s*\((\d{4})\))"
    )
    .unwrap();

    static ref NUMERIC_LIST_RE: Regex = Regex::new(r"\[(\d+(?:\s*,\s*\d+)*)\]").unwrap();
    static ref NUMERIC_RANGE_RE: Regex = Regex::new(r"\[(\d+\s*-\s*\d+)\]").unwrap();
}

/// Context window radius around a citation marker, in characters.
const CONTEXT_WINDOW: usize = 100;

/// Location of a citation in the document: paragraph index (double-newline
/// breaks) and character offset since the last paragraph break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CitationLocation {
    pub paragraph: usize,
    pub offset: usize,
}

/// A resolved pairing between an in-text citation marker and a reference.
/// First match wins when several candidates qualify.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CitationLink {
    pub citation_text: String,
    pub reference: Reference,
    pub context: String,
    pub location: CitationLocation,
}

impl CitationLink {
    pub fn to_citation(&self) -> Citation {
        Citation {
            text: self.citation_text.clone(),
            references: vec![self.reference.clone()],
            context: self.context.clone(),
        }
    }
}

/// A citation whose resolution is suspect. Currently produced only for links
/// carrying a structurally empty reference; retained as the hook for keeping
/// unresolved citations in a future revision.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CitationIssue {
    pub kind: String,
    pub citation_text: String,
    pub context: String,
    pub location: CitationLocation,
}

/// Processes in-text citations and links them to references.
#[derive(Debug, Default)]
pub struct CitationProcessor {
    references: Vec<Reference>,
    citation_links: Vec<CitationLink>,
}

impl CitationProcessor {
    pub fn new(references: Vec<Reference>) -> Self {
        Self {
            references,
            citation_links: Vec::new(),
        }
    }

    /// Detect and resolve every citation in `text`.
    pub fn process_citations(&mut self, text: &str) -> Vec<CitationLink> {
        let mut links = Vec::new();
        // Spans (byte ranges) already consumed by the cross-reference pass.
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        // 1. Cross-references. Every match claims its span, resolved or not,
        //    so the bare author-year pass cannot re-match it.
        for captures in CROSS_REF_RE.captures_iter(text) {
            let Some(marker) = captures.get(1) else { continue };
            claimed.push((marker.start(), marker.end()));
            let name = &captures[2];
            let Ok(year) = captures[3].parse::<i32>() else { continue };
            if let Some(reference) = self.find_author_year_reference(name, year) {
                links.push(self.make_link(text, marker.as_str(), marker.start(), reference));
            }
        }

        // 2. Numeric groups: comma lists and ranges. An out-of-range index
        //    invalidates the whole group.
        for pattern in [&*NUMERIC_LIST_RE, &*NUMERIC_RANGE_RE] {
            for captures in pattern.captures_iter(text) {
                let Some(marker) = captures.get(0) else { continue };
                if let Some(indices) = self.parse_numeric_indices(&captures[1]) {
                    if let Some(reference) = indices.first().map(|&i| self.references[i].clone()) {
                        links.push(self.make_link(
                            text,
                            marker.as_str(),
                            marker.start(),
                            reference,
                        ));
                    }
                } else {
                    debug!(marker = marker.as_str(), "numeric citation out of range");
                }
            }
        }

        // 3. Author-year, skipping spans claimed by cross-references.
        let author_year_patterns: [&Regex; 3] =
            [&AUTHOR_YEAR_RE, &TWO_AUTHOR_FIRST_RE, &TWO_AUTHOR_SECOND_RE];
        for (pattern_index, pattern) in author_year_patterns.iter().enumerate() {
            for captures in pattern.captures_iter(text) {
                let Some(marker) = captures.get(1) else { continue };
                if overlaps_any(&claimed, marker.start(), marker.end()) {
                    continue;
                }
                // The bare pattern must not match a year group that is itself
                // wrapped in a further closing paren.
                if pattern_index == 0 && text[marker.end()..].trim_start().starts_with(')') {
                    continue;
                }
                let name = &captures[2];
                let Ok(year) = captures[3].parse::<i32>() else { continue };
                if let Some(reference) = self.find_author_year_reference(name, year) {
                    links.push(self.make_link(text, marker.as_str(), marker.start(), reference));
                }
            }
        }

        debug!(n = links.len(), "resolved citation links");
        self.citation_links = links.clone();
        links
    }

    /// Adjacency mapping from reference title (raw text when untitled) to the
    /// contexts citing it, deduplicated per title.
    pub fn citation_graph(&self) -> std::collections::BTreeMap<String, Vec<String>> {
        let mut graph: std::collections::BTreeMap<String, Vec<String>> = Default::default();
        for link in &self.citation_links {
            let contexts = graph
                .entry(link.reference.display_title().to_string())
                .or_default();
            if !contexts.contains(&link.context) {
                contexts.push(link.context.clone());
            }
        }
        graph
    }

    /// Report links whose reference resolution is suspect. Resolution
    /// currently retains no unresolved links, so this flags only structurally
    /// empty references.
    pub fn validate_citations(&self) -> Vec<CitationIssue> {
        self.citation_links
            .iter()
            .filter(|link| link.reference.raw_text.trim().is_empty())
            .map(|link| CitationIssue {
                kind: "unresolved_citation".to_string(),
                citation_text: link.citation_text.clone(),
                context: link.context.clone(),
                location: link.location,
            })
            .collect()
    }

    pub fn links(&self) -> &[CitationLink] {
        &self.citation_links
    }

    // ── Resolution helpers ─────────────────────────────────────────────────

    /// Map a 1-based numeric group (`"1, 3"` or `"1-3"`) to 0-based reference
    /// indices. Returns `None` when any index falls outside the reference
    /// list — the whole group is invalid, never partially resolved.
    fn parse_numeric_indices(&self, numbers: &str) -> Option<Vec<usize>> {
        let len = self.references.len();
        if let Some((start, end)) = numbers.split_once('-') {
            let start: usize = start.trim().parse().ok()?;
            let end: usize = end.trim().parse().ok()?;
            if start == 0 || start > len || end > len || end < start {
                return None;
            }
            Some(((start - 1)..end).collect())
        } else {
            let mut indices = Vec::new();
            for token in numbers.split(',') {
                let position: usize = token.trim().parse().ok()?;
                if position == 0 || position > len {
                    return None;
                }
                indices.push(position - 1);
            }
            Some(indices)
        }
    }

    /// Exact year match AND case-insensitive last-name prefix match.
    fn find_author_year_reference(&self, name: &str, year: i32) -> Option<Reference> {
        let name = name.to_lowercase();
        self.references
            .iter()
            .find(|reference| {
                reference.year == Some(year)
                    && reference.authors.iter().any(|author| {
                        author
                            .last_name
                            .as_deref()
                            .is_some_and(|last| last.to_lowercase().starts_with(&name))
                    })
            })
            .cloned()
    }

    fn make_link(
        &self,
        text: &str,
        marker: &str,
        start: usize,
        reference: Reference,
    ) -> CitationLink {
        if reference.raw_text.trim().is_empty() {
            warn!(marker, "citation resolved to an empty reference record");
        }
        CitationLink {
            citation_text: marker.trim().to_string(),
            reference,
            context: context_window(text, start, start + marker.len()),
            location: locate(text, start),
        }
    }
}

fn overlaps_any(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e)| start < e && s < end)
}

/// ±`CONTEXT_WINDOW` characters around a match, clamped to char boundaries.
fn context_window(text: &str, start: usize, end: usize) -> String {
    let mut lo = start.saturating_sub(CONTEXT_WINDOW);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + CONTEXT_WINDOW).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    text[lo..hi].trim().to_string()
}

/// Paragraph index by counting double-newline breaks before the match, and
/// the character offset since the last one.
fn locate(text: &str, start: usize) -> CitationLocation {
    let before = &text[..start];
    let paragraph = before.matches("\n\n").count();
    let offset = match before.rfind("\n\n") {
        Some(i) => start - (i + 2),
        None => start,
    };
    CitationLocation { paragraph, offset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_common::metadata::Author;

    fn reference(title: &str, last_name: Option<&str>, year: i32) -> Reference {
        Reference {
            raw_text: format!("{} ({})", title, year),
            title: Some(title.to_string()),
            authors: last_name
                .map(|name| vec![Author::from_full_name(format!("A. {}", name))])
                .unwrap_or_default(),
            year: Some(year),
            ..Default::default()
        }
    }

    #[test]
    fn test_cross_reference_takes_precedence_over_author_year() {
        let refs = vec![reference("Deep graphs", Some("Smith"), 2023)];
        let mut processor = CitationProcessor::new(refs);
        let links = processor.process_citations("As shown by cf. Smith et al. (2023) this holds.");
        assert_eq!(links.len(), 1, "must not double-count the cf. span");
        assert!(links[0].citation_text.starts_with("cf."));
        assert_eq!(links[0].reference.title.as_deref(), Some("Deep graphs"));
    }

    #[test]
    fn test_numeric_range_expansion() {
        let refs = vec![
            reference("A", None, 2020),
            reference("B", None, 2021),
            reference("C", None, 2022),
        ];
        let processor = CitationProcessor::new(refs);
        assert_eq!(
            processor.parse_numeric_indices("1-3"),
            Some(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_numeric_out_of_range_invalidates_whole_group() {
        let refs = vec![reference("A", None, 2020), reference("B", None, 2021)];
        let mut processor = CitationProcessor::new(refs);
        assert_eq!(processor.parse_numeric_indices("1, 5"), None);
        let links = processor.process_citations("Bad group [1, 5] here.");
        assert!(links.is_empty());
    }

    #[test]
    fn test_end_to_end_numeric_and_author_year() {
        let refs = vec![
            reference("A", None, 2022),
            reference("B", Some("Jones"), 2022),
        ];
        let mut processor = CitationProcessor::new(refs);
        let links =
            processor.process_citations("Results improved [1]. See also Jones and Brown (2022).");
        assert_eq!(links.len(), 2);

        let numeric = links.iter().find(|l| l.citation_text == "[1]").unwrap();
        assert_eq!(numeric.reference.title.as_deref(), Some("A"));

        let author_year = links
            .iter()
            .find(|l| l.citation_text.contains("Jones"))
            .unwrap();
        assert_eq!(author_year.reference.title.as_deref(), Some("B"));
    }

    #[test]
    fn test_author_year_requires_exact_year() {
        let refs = vec![reference("A", Some("Smith"), 2020)];
        let mut processor = CitationProcessor::new(refs);
        assert!(processor
            .process_citations("Smith et al. (2021) disagrees.")
            .is_empty());
    }

    #[test]
    fn test_last_name_prefix_match_is_case_insensitive() {
        let refs = vec![reference("A", Some("Smithson"), 2020)];
        let mut processor = CitationProcessor::new(refs);
        let links = processor.process_citations("Smith et al. (2020) observed this.");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_location_counts_paragraph_breaks() {
        let refs = vec![reference("A", Some("Smith"), 2020)];
        let mut processor = CitationProcessor::new(refs);
        let links = processor.process_citations("First paragraph.\n\nSecond one: Smith (2020).");
        assert_eq!(links[0].location.paragraph, 1);
        assert!(links[0].location.offset > 0);
    }

    #[test]
    fn test_citation_graph_groups_contexts_by_title() {
        let refs = vec![reference("A", Some("Smith"), 2020)];
        let mut processor = CitationProcessor::new(refs);
        let filler = "x".repeat(250);
        let text = format!("Smith (2020) early. {} Later Smith (2020) again.", filler);
        processor.process_citations(&text);
        let graph = processor.citation_graph();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph["A"].len(), 2, "distinct contexts are both kept");
    }

    #[test]
    fn test_validate_citations_is_empty_for_resolved_links() {
        let refs = vec![reference("A", Some("Smith"), 2020)];
        let mut processor = CitationProcessor::new(refs);
        processor.process_citations("Smith (2020) observed this.");
        assert!(processor.validate_citations().is_empty());
    }
}
