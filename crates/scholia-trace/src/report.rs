//! Human-readable rendering of traceability results.

use std::fmt::Write;

use crate::resolver::{SourceFrequency, TraceabilityRow};
use crate::tables::{QueryResult, ReportRecord};

/// Query, generated response, ranked sources, and the engine's cost line.
pub fn format_query_response(
    query: &str,
    result: &QueryResult,
    sources: &[SourceFrequency],
) -> String {
    let mut references = String::new();
    for (i, source) in sources.iter().enumerate() {
        let _ = writeln!(references, "{}. {}", i + 1, source.title);
    }

    format!(
        "**Query:** {}\n\n\
         **Generated response:**\n\n{}\n\n\
         **Most-matched source documents:**\n\n{}\n\
         **Performance**\n\nLLM calls: {}\n\
         \nLLM tokens: {}\n\
         \nCompletion time: {:.2}\n",
        query, result.response, references, result.llm_calls, result.prompt_tokens,
        result.completion_time
    )
}

/// Query plus the full text of every supporting community report.
pub fn format_supporting_reports(query: &str, reports: &[ReportRecord]) -> String {
    let mut analyses = String::new();
    for report in reports {
        let _ = write!(
            analyses,
            "\n**Report:** {}\n\n**Title:** {}\n\n{}\n\n---\n---\n\n",
            report.id, report.title, report.content
        );
    }
    format!(
        "**Query:** {}\n\n**Key supporting analyses:**\n{}\n",
        query, analyses
    )
}

/// Text units backing the requested report ids. The input is a
/// comma-separated id list; each unknown id gets its own inline error
/// message instead of aborting the whole lookup.
pub fn text_units_for_reports(report_ids: &str, rows: &[TraceabilityRow]) -> String {
    let mut text_units = String::new();
    for report_id in report_ids.split(',').map(str::trim) {
        let matched: Vec<&TraceabilityRow> =
            rows.iter().filter(|row| row.report_id == report_id).collect();
        if matched.is_empty() {
            let _ = write!(
                text_units,
                "\nThere was an issue retrieving Report {}.\n\n\
                 Please double-check that you entered the report ID correctly and try again!\n",
                report_id
            );
            continue;
        }
        let _ = write!(
            text_units,
            "\n**==Report {}== was based on the following texts:**\n",
            report_id
        );
        for row in matched {
            let _ = write!(
                text_units,
                "\n**Source:** {}\n\n**Source text snippet:**\n\n{}\n\n---\n\n",
                row.title, row.text_unit_content
            );
        }
    }
    text_units.push_str("\n### END OF REPORT ###");

    format!(
        "**The following are the original text snippets on which the report(s) you queried are based:**\n{}",
        text_units
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(report_id: &str, title: &str, content: &str) -> TraceabilityRow {
        TraceabilityRow {
            report_id: report_id.to_string(),
            title: title.to_string(),
            text_unit_content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_query_response_numbers_sources_and_rounds_time() {
        let result = QueryResult {
            response: "Answer.".to_string(),
            llm_calls: 3,
            prompt_tokens: 1200,
            completion_time: 4.567,
            ..Default::default()
        };
        let sources = vec![
            SourceFrequency {
                title: "Paper A".to_string(),
                frequency: 4,
            },
            SourceFrequency {
                title: "Paper B".to_string(),
                frequency: 2,
            },
        ];
        let formatted = format_query_response("What is X?", &result, &sources);
        assert!(formatted.contains("**Query:** What is X?"));
        assert!(formatted.contains("1. Paper A\n2. Paper B\n"));
        assert!(formatted.contains("LLM calls: 3"));
        assert!(formatted.contains("Completion time: 4.57"));
    }

    #[test]
    fn test_text_units_group_rows_by_report() {
        let rows = vec![
            row("2", "Paper A", "First passage."),
            row("2", "Paper B", "Second passage."),
        ];
        let formatted = text_units_for_reports("2", &rows);
        assert!(formatted.contains("**==Report 2== was based on the following texts:**"));
        assert!(formatted.contains("**Source:** Paper A"));
        assert!(formatted.contains("Second passage."));
        assert!(formatted.ends_with("### END OF REPORT ###"));
    }

    #[test]
    fn test_unknown_report_id_gets_inline_error() {
        let rows = vec![row("2", "Paper A", "First passage.")];
        let formatted = text_units_for_reports("2, 99", &rows);
        assert!(formatted.contains("**==Report 2=="));
        assert!(formatted.contains("There was an issue retrieving Report 99."));
    }
}
