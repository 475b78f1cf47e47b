//! Front-matter heuristics: title, author, and abstract detection from raw
//! lines.
//!
//! This is fuzzy pattern matching over messy converter output, not a grammar.
//! It sits behind the `TextHeuristicClassifier` trait so the cascade can be
//! swapped for a statistical or learned model without touching consumers.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use scholia_common::metadata::Author;

/// Candidate front matter detected from the head of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub authors: Vec<Author>,
    pub abstract_text: Option<String>,
}

/// Contract for heuristic front-matter detection.
pub trait TextHeuristicClassifier: Send + Sync {
    fn classify(&self, lines: &[&str]) -> FrontMatter;
}

lazy_static! {
    static ref ABSTRACT_HEADING_RE: Regex =
        Regex::new(r"(?i)^\s*(?:#+\s*)?abstract\s*[:.]?\s*$").unwrap();
    static ref SECTION_HEADING_RE: Regex =
        Regex::new(r"(?i)^\s*(?:#+\s*|\d+\.?\s+)?(introduction|keywords|related work)\b").unwrap();
    /// A personal name: 2-4 capitalised words, allowing initials.
    static ref NAME_RE: Regex =
        Regex::new(r"^[A-Z][a-zA-Z.'-]*(?:\s+[A-Z][a-zA-Z.'-]*){1,3}$").unwrap();
    static ref EMAIL_OR_URL_RE: Regex = Regex::new(r"@|https?://|www\.").unwrap();
}

/// How many leading non-empty lines are considered front matter.
const HEAD_WINDOW: usize = 30;

/// Default cascade over raw converter output lines.
#[derive(Debug, Default)]
pub struct LayoutHeuristicClassifier;

impl LayoutHeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    fn is_title_candidate(line: &str) -> bool {
        let words = line.split_whitespace().count();
        if !(3..=30).contains(&words) {
            return false;
        }
        let lowered = line.to_lowercase();
        if lowered.starts_with("arxiv") || lowered.starts_with("doi") {
            return false;
        }
        if EMAIL_OR_URL_RE.is_match(line) {
            return false;
        }
        // Dates, page headers, and figure captions start with digits.
        if line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        true
    }

    /// Split an author line on separators and keep the tokens that look like
    /// personal names, stripped of affiliation markers.
    fn parse_author_line(line: &str) -> Vec<Author> {
        let cleaned = line.replace(" and ", ",").replace('&', ",");
        cleaned
            .split(',')
            .map(|token| token.trim().trim_matches(|c: char| "*†‡0123456789".contains(c)))
            .map(str::trim)
            .filter(|token| NAME_RE.is_match(token))
            .map(Author::from_full_name)
            .collect()
    }
}

impl TextHeuristicClassifier for LayoutHeuristicClassifier {
    fn classify(&self, lines: &[&str]) -> FrontMatter {
        let head: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .map(|(i, l)| (i, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .take(HEAD_WINDOW)
            .collect();

        let mut front = FrontMatter::default();

        // Title: first plausible line, markdown heading markers stripped.
        let mut title_pos = None;
        for &(i, line) in &head {
            let stripped = line.trim_start_matches('#').trim();
            if Self::is_title_candidate(stripped) {
                front.title = Some(stripped.to_string());
                title_pos = Some(i);
                break;
            }
        }

        // Authors: the first few non-empty lines after the title that parse
        // as name lists. Stops at the abstract.
        if let Some(title_pos) = title_pos {
            for &(i, line) in &head {
                if i <= title_pos {
                    continue;
                }
                if ABSTRACT_HEADING_RE.is_match(line) || SECTION_HEADING_RE.is_match(line) {
                    break;
                }
                let authors = Self::parse_author_line(line);
                if !authors.is_empty() {
                    front.authors.extend(authors);
                } else if !front.authors.is_empty() {
                    // Name block ended (affiliations, emails, ...).
                    break;
                }
                if i > title_pos + 4 {
                    break;
                }
            }
        }

        // Abstract: everything between an "Abstract" heading and the next
        // section heading or hard break.
        if let Some(start) = lines
            .iter()
            .position(|line| ABSTRACT_HEADING_RE.is_match(line))
        {
            let mut collected: Vec<&str> = Vec::new();
            for line in &lines[start + 1..] {
                let trimmed = line.trim();
                if SECTION_HEADING_RE.is_match(trimmed) {
                    break;
                }
                if trimmed.is_empty() {
                    if !collected.is_empty() {
                        break;
                    }
                    continue;
                }
                collected.push(trimmed);
            }
            if !collected.is_empty() {
                front.abstract_text = Some(collected.join(" "));
            }
        }

        debug!(
            title_found = front.title.is_some(),
            authors = front.authors.len(),
            abstract_found = front.abstract_text.is_some(),
            "front-matter classification"
        );
        front
    }
}
