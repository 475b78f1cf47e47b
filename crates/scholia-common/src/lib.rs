//! scholia-common — Shared metadata types, validation, errors, and
//! configuration used across all Scholia crates.

pub mod error;
pub mod metadata;
pub mod validation;
pub mod format;
pub mod config;
pub mod telemetry;

// Re-export commonly used types
pub use error::{Result, ScholiaError};
pub use metadata::{AcademicMetadata, Author, Citation, Equation, EquationType, Reference};
