//! Resolution from cited identifiers to supporting passages.
//!
//! The response text carries markers like `Reports (2, 5)`,
//! `Entities (11, 12)` and `Relationships (4)`. Resolution pairs entity and
//! relationship ids positionally, joins them against the corpus tables, and
//! never drops a cited id: unresolvable fields are filled with sentinels
//! instead of discarding the row.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::tables::{CorpusTables, QueryResult, ReportRecord};

/// Sentinel for a field the pairing or a join could not fill.
pub const INCOMPLETE_MATCH: &str = "incomplete match";
/// Sentinel for a text-unit id missing after both join fallbacks.
pub const NO_DIRECT_MATCH: &str = "no direct match";

lazy_static! {
    // Main id group plus an optional continuation after a semicolon.
    static ref REPORT_GROUPS_RE: Regex =
        Regex::new(r"Reports \(([^)]+)\)(?:; \(([^)]+)\))?").unwrap();
    static ref ENTITY_GROUPS_RE: Regex = Regex::new(r"Entities \(([^)]+)\)").unwrap();
    static ref RELATIONSHIP_GROUPS_RE: Regex =
        Regex::new(r"Relationships \(([^)]+)\)").unwrap();
}

/// One fully resolved evidentiary path: cited ids down to the literal
/// passage and the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceabilityRow {
    pub report_id: String,
    pub entity_id: String,
    pub relationship_id: String,
    pub text_unit_id: String,
    pub text_unit_content: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFrequency {
    pub title: String,
    pub frequency: usize,
}

/// The full resolution output: the traceability table, the cited subset of
/// the report table, and the median-filtered source ranking.
#[derive(Debug, Clone, Default)]
pub struct Traceability {
    pub rows: Vec<TraceabilityRow>,
    pub relevant_reports: Vec<ReportRecord>,
    pub most_frequent_sources: Vec<SourceFrequency>,
}

impl Default for TraceabilityRow {
    fn default() -> Self {
        Self {
            report_id: String::new(),
            entity_id: INCOMPLETE_MATCH.to_string(),
            relationship_id: INCOMPLETE_MATCH.to_string(),
            text_unit_id: NO_DIRECT_MATCH.to_string(),
            text_unit_content: INCOMPLETE_MATCH.to_string(),
            title: INCOMPLETE_MATCH.to_string(),
        }
    }
}

/// Extract all unique numeric report ids cited in the response text,
/// sorted numerically.
pub fn cited_report_ids(response: &str) -> Vec<String> {
    let mut ids: HashSet<String> = HashSet::new();
    for caps in REPORT_GROUPS_RE.captures_iter(response) {
        for group in [caps.get(1), caps.get(2)].into_iter().flatten() {
            ids.extend(numeric_tokens(group.as_str()));
        }
    }
    let mut sorted: Vec<String> = ids.into_iter().collect();
    sorted.sort_by_key(|id| id.parse::<u64>().unwrap_or(u64::MAX));
    sorted
}

fn numeric_tokens(group: &str) -> Vec<String> {
    group
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

struct BaseRow {
    report_id: String,
    entity_id: String,
    relationship_id: String,
}

/// Positional pairing of one report's entity and relationship id groups.
/// Produces exactly `max(entities, relationships)` rows; the shorter list
/// is padded with the incomplete-match sentinel, never truncated.
fn pair_ids(report_id: &str, content: &str) -> Vec<BaseRow> {
    let mut entity_ids = Vec::new();
    for caps in ENTITY_GROUPS_RE.captures_iter(content) {
        entity_ids.extend(numeric_tokens(&caps[1]));
    }
    let mut relationship_ids = Vec::new();
    for caps in RELATIONSHIP_GROUPS_RE.captures_iter(content) {
        relationship_ids.extend(numeric_tokens(&caps[1]));
    }

    let count = entity_ids.len().max(relationship_ids.len());
    (0..count)
        .map(|i| BaseRow {
            report_id: report_id.to_string(),
            entity_id: entity_ids
                .get(i)
                .cloned()
                .unwrap_or_else(|| INCOMPLETE_MATCH.to_string()),
            relationship_id: relationship_ids
                .get(i)
                .cloned()
                .unwrap_or_else(|| INCOMPLETE_MATCH.to_string()),
        })
        .collect()
}

pub struct TraceabilityResolver {
    // hrid -> exploded text-unit ids
    relationship_units: HashMap<String, Vec<String>>,
    // hrid -> exploded source ids
    entity_units: HashMap<String, Vec<String>>,
    // text-unit id -> content
    text_unit_content: HashMap<String, String>,
    // text-unit id -> owning document titles, in table order
    unit_titles: HashMap<String, Vec<String>>,
}

impl TraceabilityResolver {
    pub fn new(tables: &CorpusTables) -> Self {
        let mut relationship_units: HashMap<String, Vec<String>> = HashMap::new();
        for rel in &tables.relationships {
            relationship_units
                .entry(rel.human_readable_id.clone())
                .or_default()
                .extend(rel.text_unit_ids.iter().cloned());
        }

        let mut entity_units: HashMap<String, Vec<String>> = HashMap::new();
        for entity in &tables.entities {
            let ids: Vec<String> = entity
                .source_id
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            entity_units
                .entry(entity.human_readable_id.clone())
                .or_default()
                .extend(ids);
        }

        let mut text_unit_content = HashMap::new();
        for unit in &tables.text_units {
            text_unit_content.insert(unit.id.clone(), unit.text.clone());
        }

        let mut unit_titles: HashMap<String, Vec<String>> = HashMap::new();
        for document in &tables.documents {
            for unit_id in &document.text_unit_ids {
                unit_titles
                    .entry(unit_id.clone())
                    .or_default()
                    .push(document.title.clone());
            }
        }

        Self {
            relationship_units,
            entity_units,
            text_unit_content,
            unit_titles,
        }
    }

    /// Resolve one answer-engine result against the corpus tables.
    pub fn resolve(&self, result: &QueryResult) -> Traceability {
        let report_ids = cited_report_ids(&result.response);
        debug!(cited = report_ids.len(), "resolving traceability");

        let mut base_rows = Vec::new();
        let mut relevant_reports = Vec::new();
        match &result.context_reports {
            Some(reports) => {
                for report in reports {
                    if !report_ids.contains(&report.id) {
                        continue;
                    }
                    base_rows.extend(pair_ids(&report.id, &report.content));
                    relevant_reports.push(report.clone());
                }
            }
            // No report table: treat the response text itself as one
            // anonymous report so entity/relationship markers still resolve.
            None => base_rows.extend(pair_ids("response", &result.response)),
        }

        let mut rows = Vec::new();
        for base in &base_rows {
            for unit_id in self.text_unit_ids_for(base) {
                rows.extend(self.expand_row(base, &unit_id));
            }
        }

        // Full-row dedup, first occurrence wins: rows sharing some but not
        // all fields are distinct evidentiary paths and must survive.
        let mut seen = HashSet::new();
        rows.retain(|row| seen.insert(row.clone()));

        let most_frequent_sources = most_frequent_sources(&rows);
        Traceability {
            rows,
            relevant_reports,
            most_frequent_sources,
        }
    }

    /// Relationship text units first, entity source ids as fallback, then
    /// the no-direct-match sentinel.
    fn text_unit_ids_for(&self, base: &BaseRow) -> Vec<String> {
        if let Some(units) = self.relationship_units.get(&base.relationship_id) {
            if !units.is_empty() {
                return units.clone();
            }
        }
        if let Some(units) = self.entity_units.get(&base.entity_id) {
            if !units.is_empty() {
                return units.clone();
            }
        }
        vec![NO_DIRECT_MATCH.to_string()]
    }

    fn expand_row(&self, base: &BaseRow, unit_id: &str) -> Vec<TraceabilityRow> {
        let content = self
            .text_unit_content
            .get(unit_id)
            .cloned()
            .unwrap_or_else(|| INCOMPLETE_MATCH.to_string());
        let titles = match self.unit_titles.get(unit_id) {
            Some(titles) if !titles.is_empty() => titles.clone(),
            _ => vec![INCOMPLETE_MATCH.to_string()],
        };
        titles
            .into_iter()
            .map(|title| TraceabilityRow {
                report_id: base.report_id.clone(),
                entity_id: base.entity_id.clone(),
                relationship_id: base.relationship_id.clone(),
                text_unit_id: unit_id.to_string(),
                text_unit_content: content.clone(),
                title,
            })
            .collect()
    }
}

/// Title frequency table reduced to titles at or above the median
/// frequency, ordered most frequent first.
pub fn most_frequent_sources(rows: &[TraceabilityRow]) -> Vec<SourceFrequency> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.title.as_str()).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return Vec::new();
    }

    let mut frequencies: Vec<usize> = counts.values().copied().collect();
    frequencies.sort_unstable();
    let mid = frequencies.len() / 2;
    let median = if frequencies.len() % 2 == 1 {
        frequencies[mid] as f64
    } else {
        (frequencies[mid - 1] + frequencies[mid]) as f64 / 2.0
    };

    let mut ranked: Vec<SourceFrequency> = counts
        .into_iter()
        .filter(|(_, frequency)| *frequency as f64 >= median)
        .map(|(title, frequency)| SourceFrequency {
            title: title.to_string(),
            frequency,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked
}
