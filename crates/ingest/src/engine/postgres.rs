//! Postgres source reader.

use std::str::FromStr;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, Executor, Statement};
use tracing::{debug, info};

use sluice_core::Credentials;

use super::builders::{build_arrays, build_schema};
use super::error::EngineError;
use super::options::ReadOptions;
use super::TabularData;

/// Credential keys that map onto connect options rather than runtime
/// parameters.
const USER_KEYS: &[&str] = &["user", "username"];
const PASSWORD_KEYS: &[&str] = &["password"];

/// Wrap a query-as-table in a `SELECT`. Subqueries need an alias in Postgres.
pub(crate) fn select_from(query: &str) -> String {
    let query = query.trim();
    if query.starts_with('(') {
        format!("SELECT * FROM {query} src")
    } else {
        format!("SELECT * FROM {query}")
    }
}

pub(crate) fn connect_options(
    url: &str,
    credentials: &Credentials,
    options: &ReadOptions,
) -> Result<PgConnectOptions, EngineError> {
    let mut connect = PgConnectOptions::from_str(url)?;

    for (key, value) in credentials.iter() {
        if USER_KEYS.contains(&key) {
            connect = connect.username(value);
        } else if PASSWORD_KEYS.contains(&key) {
            connect = connect.password(value);
        } else {
            connect = connect.options([(key, value)]);
        }
    }

    // ISO output keeps date rendering aligned with the session date format.
    connect = connect
        .options([("DateStyle", "ISO, YMD"), ("TimeZone", "UTC")])
        .application_name("sluice-ingest");
    let properties = options
        .driver_properties()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    debug!(properties = %properties, "prepared postgres connect options");
    Ok(connect)
}

/// Run `query` in a single read transaction and collect it as one batch.
pub(crate) async fn read(
    url: &str,
    query: &str,
    credentials: &Credentials,
    options: &ReadOptions,
) -> Result<TabularData, EngineError> {
    let connect = connect_options(url, credentials, options)?;
    let mut conn = connect.connect().await?;
    let mut tx = conn.begin().await?;

    let isolation = format!(
        "SET TRANSACTION ISOLATION LEVEL {}",
        options.isolation_level.as_sql()
    );
    (&mut *tx).execute(isolation.as_str()).await?;

    let sql = select_from(query);
    debug!(sql = %sql, "executing extraction query");

    let statement = (&mut *tx).prepare(sql.as_str()).await?;
    let (schema, kinds) = build_schema(statement.columns(), options)?;
    let schema = Arc::new(schema);

    let rows = statement.query().fetch_all(&mut *tx).await?;
    tx.commit().await?;
    conn.close().await?;

    let arrays = build_arrays(&rows, &kinds)?;
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    info!(rows = batch.num_rows(), columns = batch.num_columns(), "extracted rows");

    Ok(TabularData::new(schema, vec![batch]))
}
