pub mod connection;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod format;
pub mod mode;
pub mod query;
pub mod schema;
pub mod table;

pub use connection::{resolve_connection, ConnectionTarget};
pub use dialect::{DbFamily, DialectSpec};
pub use engine::{
    EngineError, LakeEngine, OutputFormat, ReadOptions, TabularData, TabularEngine, WriteRequest,
    WriteSummary,
};
pub use error::IngestError;
pub use format::{resolve_format, AVRO_WRITER};
pub use mode::{IngestionMode, WriteMode};
pub use query::build_query;
pub use schema::{avro_to_arrow, fetch_schema, reconcile};
pub use table::{plan_table, process_table, table_mode, TablePlan, TableReport, TableRequest};
