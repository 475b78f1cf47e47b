//! Citation and bibliography formatting.
//!
//! Formatters never fail: a reference too malformed to format falls back to
//! its raw text.

use serde::{Deserialize, Serialize};

use crate::metadata::{Author, Reference};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    #[default]
    Apa,
    Mla,
    Chicago,
}

/// A citation formatter for one bibliographic style.
pub trait CitationFormatter: Send + Sync {
    /// Format a single in-text citation.
    fn format_citation(&self, reference: &Reference) -> String;

    /// Format a sorted bibliography.
    fn format_bibliography(&self, references: &[Reference]) -> String;
}

/// Create the formatter for a style.
pub fn formatter_for(style: CitationStyle) -> Box<dyn CitationFormatter> {
    match style {
        CitationStyle::Apa     => Box::new(ApaFormatter),
        CitationStyle::Mla     => Box::new(MlaFormatter),
        CitationStyle::Chicago => Box::new(ChicagoFormatter),
    }
}

// ── Shared helpers ─────────────────────────────────────────────────────────

fn format_author(author: &Author, use_full_names: bool) -> String {
    if !use_full_names {
        if let Some(last) = &author.last_name {
            return last.clone();
        }
        return author.display_name().to_string();
    }
    match (&author.last_name, &author.first_name) {
        (Some(last), Some(first)) => format!("{}, {}", last, first),
        _ => author.display_name().to_string(),
    }
}

fn format_authors(authors: &[Author], use_full_names: bool) -> String {
    match authors {
        [] => "Unknown Author".to_string(),
        [one] => format_author(one, use_full_names),
        [first, second] => format!(
            "{} and {}",
            format_author(first, use_full_names),
            format_author(second, use_full_names)
        ),
        [first, ..] => format!("{} et al.", format_author(first, use_full_names)),
    }
}

fn clean_title(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t.trim().trim_end_matches('.').to_string(),
        _ => "Untitled".to_string(),
    }
}

fn year_or_nd(year: Option<i32>) -> String {
    year.map_or_else(|| "n.d.".to_string(), |y| y.to_string())
}

fn sort_key(reference: &Reference) -> (String, String) {
    let author = reference
        .authors
        .first()
        .and_then(|a| a.last_name.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    (author, year_or_nd(reference.year))
}

fn sorted_refs(references: &[Reference]) -> Vec<&Reference> {
    let mut refs: Vec<&Reference> = references.iter().collect();
    refs.sort_by_key(|r| sort_key(r));
    refs
}

// ── APA (7th edition) ──────────────────────────────────────────────────────

pub struct ApaFormatter;

impl CitationFormatter for ApaFormatter {
    fn format_citation(&self, reference: &Reference) -> String {
        let authors = format_authors(&reference.authors, false);
        format!("({}, {})", authors, year_or_nd(reference.year))
    }

    fn format_bibliography(&self, references: &[Reference]) -> String {
        sorted_refs(references)
            .iter()
            .map(|r| {
                let mut entry = format!(
                    "{} ({}). {}. {}.",
                    format_authors(&r.authors, true),
                    year_or_nd(r.year),
                    clean_title(r.title.as_deref()),
                    r.venue.as_deref().unwrap_or("Unknown venue"),
                );
                if let Some(doi) = &r.doi {
                    entry.push_str(&format!(" https://doi.org/{}", doi));
                }
                entry
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ── MLA (9th edition) ──────────────────────────────────────────────────────

pub struct MlaFormatter;

impl CitationFormatter for MlaFormatter {
    fn format_citation(&self, reference: &Reference) -> String {
        // Page numbers would be added in context
        format!("({} n.p.)", format_authors(&reference.authors, false))
    }

    fn format_bibliography(&self, references: &[Reference]) -> String {
        sorted_refs(references)
            .iter()
            .map(|r| {
                let mut entry = format!(
                    "{}. \"{}\". {}, {}",
                    format_authors(&r.authors, true),
                    clean_title(r.title.as_deref()),
                    r.venue.as_deref().unwrap_or("Unknown venue"),
                    year_or_nd(r.year),
                );
                if let Some(doi) = &r.doi {
                    entry.push_str(&format!(", https://doi.org/{}", doi));
                }
                entry.push('.');
                entry
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ── Chicago (17th edition) ─────────────────────────────────────────────────

pub struct ChicagoFormatter;

impl CitationFormatter for ChicagoFormatter {
    fn format_citation(&self, reference: &Reference) -> String {
        format!(
            "({} {})",
            format_authors(&reference.authors, false),
            year_or_nd(reference.year)
        )
    }

    fn format_bibliography(&self, references: &[Reference]) -> String {
        sorted_refs(references)
            .iter()
            .map(|r| {
                let mut entry = format!(
                    "{}. {}. \"{}\". {}",
                    format_authors(&r.authors, true),
                    year_or_nd(r.year),
                    clean_title(r.title.as_deref()),
                    r.venue.as_deref().unwrap_or("Unknown venue"),
                );
                if let Some(doi) = &r.doi {
                    entry.push_str(&format!(". https://doi.org/{}", doi));
                }
                entry.push('.');
                entry
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
