//! The tabular engine: pulls a query result from a relational source into
//! Arrow and pushes Arrow tables into the lake.
//!
//! Ingestion only talks to [`TabularEngine`]. [`LakeEngine`] is the concrete
//! engine used by the CLI; tests substitute their own.

mod builders;
mod error;
mod lake;
mod options;
pub(crate) mod partition;
mod postgres;
pub(crate) mod writer;

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

use sluice_core::Credentials;

use crate::connection::ConnectionTarget;
use crate::mode::WriteMode;

pub use error::EngineError;
pub use lake::LakeEngine;
pub use options::{IsolationLevel, ReadOptions};
pub use partition::HIVE_DEFAULT_PARTITION;
pub use writer::OutputFormat;

/// An in-memory table handle: one schema, any number of batches.
#[derive(Debug, Clone)]
pub struct TabularData {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl TabularData {
    /// Batches must all carry `schema`.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// Collapse into one batch (an empty batch when there are none).
    pub fn concat(&self) -> Result<RecordBatch, EngineError> {
        Ok(concat_batches(&self.schema, &self.batches)?)
    }
}

/// Everything the engine needs to persist one table.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Writer identifier, already resolved through the format aliases.
    pub format: String,
    pub mode: WriteMode,
    pub partition_by: Option<String>,
    /// Lake path of the table directory, `<location>/<tableName>`.
    pub destination: String,
    /// Extra key/value pairs for formats that carry file metadata.
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows: u64,
    /// Lake paths of the files written, in write order.
    pub files: Vec<String>,
    /// Files removed before writing (overwrite only).
    pub replaced: usize,
}

/// Relational pull and columnar push. Both calls complete before returning;
/// any parallelism is internal to the engine.
#[async_trait]
pub trait TabularEngine: Send + Sync {
    /// Run `query` (a table name or a parenthesized subquery) against `target`.
    async fn read(
        &self,
        target: &ConnectionTarget,
        query: &str,
        credentials: &Credentials,
        options: &ReadOptions,
    ) -> Result<TabularData, EngineError>;

    /// Persist `table` as described by `request`.
    async fn write(
        &self,
        table: &TabularData,
        request: &WriteRequest,
    ) -> Result<WriteSummary, EngineError>;
}
