//! Corpus tables and the answer-engine result shape.
//!
//! These mirror the tabular exports of the answer engine: flat records
//! with stable column names, deserialized straight from the engine's JSON.

use serde::{Deserialize, Serialize};

/// One row of the entity table. `source_id` is a comma-separated list of
/// text-unit ids, kept raw as the engine emits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub human_readable_id: String,
    #[serde(default)]
    pub source_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub human_readable_id: String,
    #[serde(default)]
    pub text_unit_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextUnitRecord {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub title: String,
    #[serde(default)]
    pub text_unit_ids: Vec<String>,
}

/// One community report from the engine's contextual report table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// The four corpus tables traceability resolution joins against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusTables {
    pub entities: Vec<EntityRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub text_units: Vec<TextUnitRecord>,
    pub documents: Vec<DocumentRecord>,
}

/// An answer-engine result: the generated response plus the contextual
/// report table (when the engine exposes one) and its cost figures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub response: String,
    #[serde(default)]
    pub context_reports: Option<Vec<ReportRecord>>,
    #[serde(default)]
    pub llm_calls: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_deserializes_from_engine_json() {
        let raw = r#"{
            "response": "See [Data: Reports (2)].",
            "context_reports": [
                {"id": "2", "title": "Community 2", "content": "Entities (11)"}
            ],
            "llm_calls": 3,
            "prompt_tokens": 1500,
            "completion_time": 2.75
        }"#;
        let result: QueryResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.llm_calls, 3);
        assert_eq!(result.context_reports.unwrap()[0].id, "2");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let result: QueryResult = serde_json::from_str(r#"{"response": "Answer."}"#).unwrap();
        assert!(result.context_reports.is_none());
        assert_eq!(result.prompt_tokens, 0);
    }
}
