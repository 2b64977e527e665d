//! Error types for the tabular engine.

use sluice_storage::StorageError;

/// Failures raised while reading from a source or writing to the lake.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The connection target has no driver in this engine.
    #[error("unsupported connection target: {0}")]
    UnsupportedTarget(String),

    /// A source column type has no Arrow decoding.
    #[error("column `{column}` has unsupported source type {type_name}; cast it in the extraction query")]
    UnsupportedColumnType { column: String, type_name: String },

    /// The writer identifier is not one this engine can produce.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The partition key does not name a column of the written table.
    #[error("partition column `{0}` not found in table")]
    PartitionColumnMissing(String),

    /// Source database error.
    #[error("source query error: {0}")]
    Source(#[from] sqlx::Error),

    /// Failed to build or transform Arrow arrays.
    #[error("Arrow conversion error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Failed to encode Parquet output.
    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Failed to encode Avro output.
    #[error("Avro write error: {0}")]
    Avro(String),

    /// Sink storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<apache_avro::Error> for EngineError {
    fn from(e: apache_avro::Error) -> Self {
        EngineError::Avro(e.to_string())
    }
}
