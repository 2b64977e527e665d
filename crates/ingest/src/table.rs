//! One table, start to finish: resolve, extract, reconcile, persist.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use sluice_core::{find_option, value_of, ConfigItem, ConfigOption, Credentials, MissingOption};
use sluice_storage::{join_path, BlobStore};

use crate::connection::{resolve_connection, ConnectionTarget};
use crate::engine::{ReadOptions, TabularEngine, WriteRequest};
use crate::error::IngestError;
use crate::format::resolve_format;
use crate::mode::{IngestionMode, WriteMode};
use crate::query::build_query;
use crate::schema::{avro_to_arrow, fetch_schema, reconcile};

/// Section reported when a table entry itself lacks `tableName`.
const TABLE_SECTION: &str = "tables";

/// Run-wide settings shared by every table of a job.
#[derive(Debug, Clone)]
pub struct TableRequest {
    pub mode: IngestionMode,
    /// Requested format, before alias resolution.
    pub format: String,
    /// Output root.
    pub location: String,
    /// Registered schema root.
    pub schemas_location: String,
}

/// Everything decided about a table before any data moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: String,
    pub mode: IngestionMode,
    pub target: ConnectionTarget,
    pub query: String,
    /// Registered schema path relative to the schema root.
    pub schema: Option<String>,
    /// Writer identifier.
    pub format: String,
    pub write_mode: WriteMode,
    pub partition_by: Option<String>,
    pub destination: String,
}

/// What a completed table run did.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    /// Connection string with secrets elided.
    pub target: String,
    pub query: String,
    pub rows: u64,
    pub write_mode: WriteMode,
    pub destination: String,
    pub files: Vec<String>,
}

/// The mode a table runs under: its own `mode` option if set, else the
/// job-wide default.
pub fn table_mode(default: IngestionMode, table_options: &[ConfigOption]) -> IngestionMode {
    find_option("mode", table_options)
        .map(|opt| IngestionMode::parse(&opt.value))
        .unwrap_or(default)
}

/// Resolve name, connection, query, format, write mode, partitioning and
/// destination for one table without touching the source or the sink.
pub fn plan_table(
    request: &TableRequest,
    source: &ConfigItem,
    table_options: &[ConfigOption],
    run_at: DateTime<Utc>,
) -> Result<TablePlan, IngestError> {
    let table = value_of("tableName", table_options)
        .map_err(|e| IngestError::missing(e, TABLE_SECTION))?
        .to_string();
    // A blank name would make the destination the output root itself.
    if table.trim().is_empty() {
        return Err(IngestError::missing(MissingOption::new("tableName"), TABLE_SECTION));
    }

    let target = resolve_connection(source, table_options)?;
    let query = build_query(&table, request.mode, table_options, &target.family, run_at)
        .map_err(|e| IngestError::missing(e, &table))?;

    let schema = find_option("schema", table_options).map(|opt| opt.value.clone());
    let format = resolve_format(&request.format);
    let write_mode = request.mode.write_mode();
    let partition_by = find_option("partitionKeys", table_options)
        .map(|opt| opt.value.trim().to_string())
        .filter(|key| !key.is_empty());
    let destination = join_path(&[&request.location, &table]);

    Ok(TablePlan {
        table,
        mode: request.mode,
        target,
        query,
        schema,
        format,
        write_mode,
        partition_by,
        destination,
    })
}

/// Ingest one table. Each step runs to completion before the next; the first
/// failure stops the table and is returned unchanged.
#[allow(clippy::too_many_arguments)]
pub async fn process_table(
    engine: &dyn TabularEngine,
    blobs: &dyn BlobStore,
    request: &TableRequest,
    source: &ConfigItem,
    sink: &ConfigItem,
    credentials: &Credentials,
    table_options: &[ConfigOption],
    run_at: DateTime<Utc>,
) -> Result<TableReport, IngestError> {
    let plan = plan_table(request, source, table_options, run_at)?;
    info!(
        table = %plan.table,
        mode = %plan.mode,
        target = %plan.target.redacted(),
        "starting table ingestion"
    );
    debug!(table = %plan.table, query = %plan.query, "built extraction query");

    let read_options = ReadOptions::session_defaults();
    let mut data = engine
        .read(&plan.target, &plan.query, credentials, &read_options)
        .await?;
    info!(table = %plan.table, rows = data.num_rows(), "extracted");

    if let Some(relative) = &plan.schema {
        let document = fetch_schema(blobs, &request.schemas_location, relative).await?;
        let registered = Arc::new(avro_to_arrow(&document)?);
        data = reconcile(&data, &registered)?;
        info!(table = %plan.table, schema = %relative, columns = registered.fields().len(), "applied registered schema");
    }

    let write = WriteRequest {
        format: plan.format.clone(),
        mode: plan.write_mode,
        partition_by: plan.partition_by.clone(),
        destination: plan.destination.clone(),
        metadata: vec![
            ("sluice.table".to_string(), plan.table.clone()),
            ("sluice.mode".to_string(), plan.mode.to_string()),
            ("sluice.source".to_string(), source.name.clone()),
            ("sluice.sink".to_string(), sink.name.clone()),
            (
                "sluice.run_at".to_string(),
                run_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ],
    };
    let summary = engine.write(&data, &write).await?;

    info!(
        table = %plan.table,
        destination = %plan.destination,
        format = %plan.format,
        write_mode = %plan.write_mode,
        rows = summary.rows,
        files = summary.files.len(),
        "table ingested"
    );

    Ok(TableReport {
        table: plan.table,
        target: plan.target.redacted(),
        query: plan.query,
        rows: summary.rows,
        write_mode: plan.write_mode,
        destination: plan.destination,
        files: summary.files,
    })
}
