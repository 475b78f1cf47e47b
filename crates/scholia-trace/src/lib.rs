//! scholia-trace — Answer-engine traceability.
//!
//! Given a generated answer that cites internal report / entity /
//! relationship identifiers, reconstruct the chain from each cited
//! identifier down to the literal supporting text passage and its source
//! document, and rank the most frequently matched source titles.

pub mod report;
pub mod resolver;
pub mod tables;

pub use resolver::{
    SourceFrequency, Traceability, TraceabilityResolver, TraceabilityRow, INCOMPLETE_MATCH,
    NO_DIRECT_MATCH,
};
pub use tables::{
    CorpusTables, DocumentRecord, EntityRecord, QueryResult, RelationshipRecord, ReportRecord,
    TextUnitRecord,
};
