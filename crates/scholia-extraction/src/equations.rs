//! Mathematical expression detection and symbol extraction.
//!
//! Extraction never fails: a text without recognisable mathematics yields an
//! empty list, and a match that cannot be processed is skipped with a log
//! line rather than aborting the scan.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use scholia_common::metadata::{Equation, EquationType};

lazy_static! {
    /// Delimiter patterns in match-priority order. Display forms come before
    /// their inline lookalikes so `$$…$$` is not consumed as `$…$`.
    static ref EQUATION_PATTERNS: Vec<(Regex, EquationType)> = vec![
        (Regex::new(r"\$\$(.*?)\$\$").unwrap(), EquationType::Display),
        (Regex::new(r"\$(.*?)\$").unwrap(), EquationType::Inline),
        (
            Regex::new(r"\\begin\{equation\}(.*?)\\end\{equation\}").unwrap(),
            EquationType::Display,
        ),
        (
            Regex::new(r"\\begin\{align\*?\}(.*?)\\end\{align\*?\}").unwrap(),
            EquationType::Display,
        ),
        (
            Regex::new(r"\\begin\{eqnarray\*?\}(.*?)\\end\{eqnarray\*?\}").unwrap(),
            EquationType::Display,
        ),
        (Regex::new(r"\\\[(.*?)\\\]").unwrap(), EquationType::Display),
        (Regex::new(r"\\\((.*?)\\\)").unwrap(), EquationType::Inline),
    ];

    static ref SUBSCRIPT_RE: Regex = Regex::new(r"_\{([^}]+)\}").unwrap();
}

/// LaTeX command names recognised as symbols.
const SYMBOL_VOCABULARY: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon",
    "theta", "lambda", "mu", "pi", "sigma",
    "sum", "prod", "int", "partial", "infty",
    "frac", "sqrt", "left", "right", "cdot",
    "mathcal", "mathbf", "mathrm", "text",
];

/// Handles extraction and classification of mathematical expressions.
#[derive(Debug, Default)]
pub struct EquationExtractor;

impl EquationExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scan text line by line for delimited mathematics. Each non-empty match
    /// becomes an `Equation` with a ±2-line context window and a monotonic
    /// identifier (`eq1`, `eq2`, ...).
    pub fn extract_equations(&self, text: &str) -> Vec<Equation> {
        let lines: Vec<&str> = text.lines().collect();
        let mut equations = Vec::new();
        let mut next_id = 1usize;

        for (i, line) in lines.iter().enumerate() {
            for (pattern, equation_type) in EQUATION_PATTERNS.iter() {
                for captures in pattern.captures_iter(line) {
                    let raw_text = captures
                        .get(1)
                        .map(|m| m.as_str().trim())
                        .unwrap_or_default();
                    if raw_text.is_empty() {
                        continue;
                    }

                    let start = i.saturating_sub(2);
                    let end = (i + 3).min(lines.len());
                    let context = lines[start..end].join("\n");

                    equations.push(Equation {
                        id: format!("eq{}", next_id),
                        raw_text: raw_text.to_string(),
                        equation_type: *equation_type,
                        context: Some(context),
                        symbols: extract_symbols(raw_text),
                    });
                    next_id += 1;
                }
            }
        }

        if equations.is_empty() {
            debug!("no equations found");
        } else {
            debug!(n = equations.len(), "extracted equations");
        }
        equations
    }
}

/// Extract symbol tokens from an equation body: known LaTeX commands,
/// single-letter variables, and subscript contents.
pub fn extract_symbols(equation: &str) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();

    for name in SYMBOL_VOCABULARY {
        if equation.contains(&format!("\\{}", name)) {
            symbols.insert((*name).to_string());
        }
    }

    // Single-letter variables: preceded by a non-backslash character and not
    // followed by another letter (so "\alpha" does not contribute "alpha"'s
    // interior letters, and "sin" contributes nothing).
    let chars: Vec<char> = equation.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if !c.is_ascii_alphabetic() || i == 0 {
            continue;
        }
        if chars[i - 1] == '\\' {
            continue;
        }
        let followed_by_letter = chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic());
        if !followed_by_letter {
            symbols.insert(c.to_string());
        }
    }

    for captures in SUBSCRIPT_RE.captures_iter(equation) {
        symbols.insert(captures[1].to_string());
    }

    symbols
}
