use thiserror::Error;

use sluice_core::MissingOption;
use sluice_storage::StorageError;

use crate::engine::EngineError;

/// Everything that stops one table's ingestion.
///
/// None of these are retried or recovered locally; the caller decides whether
/// the run continues.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("missing mandatory option `{option}` in config section `{section}`")]
    MissingOption { option: String, section: String },

    #[error("schema field `{field}` has type `{avro_type}` with no Arrow mapping")]
    UnmappedSchemaType { field: String, avro_type: String },

    #[error("registered schema field `{field}` is not present in the extracted data")]
    ProjectionMismatch { field: String },

    #[error("schema document error: {0}")]
    SchemaParse(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Convert an accessor miss, naming `section` unless the miss already
    /// carries one.
    pub fn missing(err: MissingOption, section: &str) -> Self {
        let err = err.in_section(section);
        IngestError::MissingOption {
            option: err.option,
            section: err.section.unwrap_or_else(|| section.to_string()),
        }
    }

    pub fn is_missing_option(&self) -> bool {
        matches!(self, IngestError::MissingOption { .. })
    }
}
