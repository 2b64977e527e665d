//! Orchestration scenarios: what gets read, from where, and how it is written.

use arrow::datatypes::DataType;

use sluice_core::ConfigItem;
use sluice_ingest::*;

use crate::fake::{accounts, opts, request, Harness, ACCOUNTS_SCHEMA};

fn oracle_source() -> ConfigItem {
    ConfigItem::new("crm", opts(&[("dbType", "oracle")]))
}

fn accounts_table() -> Vec<sluice_core::ConfigOption> {
    opts(&[
        ("tableName", "ACCOUNTS"),
        ("host", "db1"),
        ("port", "1521"),
        ("dbName", "ORCL"),
        ("mode", "full"),
    ])
}

#[tokio::test]
async fn test_accounts_full_reload() {
    let h = Harness::new(accounts());
    let report = h
        .run(&request(IngestionMode::Full, "parquet"), &oracle_source(), &accounts_table())
        .await
        .unwrap();

    let reads = h.engine.reads.lock().unwrap();
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].target.url, "jdbc:oracle:thin:/@db1:1521/ORCL");
    assert_eq!(reads[0].query, "ACCOUNTS");
    assert_eq!(reads[0].options, ReadOptions::session_defaults());

    let writes = h.engine.writes.lock().unwrap();
    let (req, data) = &writes[0];
    assert_eq!(req.mode, WriteMode::Overwrite);
    assert_eq!(req.destination, "lake/raw/ACCOUNTS");
    assert_eq!(req.format, "parquet");
    assert_eq!(req.partition_by, None);
    // No schema option: the extracted shape is written unchanged.
    assert_eq!(data.column_names(), vec!["id", "name", "legacy_flag"]);

    assert_eq!(report.rows, 3);
    assert_eq!(report.write_mode, WriteMode::Overwrite);
    assert_eq!(report.files.len(), 1);
}

#[tokio::test]
async fn test_registered_schema_projects_columns() {
    let h = Harness::new(accounts());
    h.put_schema("accounts.avsc", ACCOUNTS_SCHEMA).await;

    let mut table = accounts_table();
    table.push(sluice_core::ConfigOption::new("schema", "accounts.avsc"));
    h.run(&request(IngestionMode::Full, "parquet"), &oracle_source(), &table)
        .await
        .unwrap();

    let writes = h.engine.writes.lock().unwrap();
    let (_, data) = &writes[0];
    assert_eq!(data.column_names(), vec!["id", "name"]);
    let schema = data.schema();
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
    assert_eq!(data.num_rows(), 3);
}

#[tokio::test]
async fn test_schema_field_missing_from_extract() {
    let h = Harness::new(accounts());
    h.put_schema(
        "accounts_v2.avsc",
        r#"{"type":"record","name":"Account","fields":[{"name":"id","type":"long"},{"name":"email","type":"string"}]}"#,
    )
    .await;

    let mut table = accounts_table();
    table.push(sluice_core::ConfigOption::new("schema", "accounts_v2.avsc"));
    let err = h
        .run(&request(IngestionMode::Full, "parquet"), &oracle_source(), &table)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::ProjectionMismatch { ref field } if field == "email"));
    assert!(h.engine.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unmapped_schema_type_stops_table() {
    let h = Harness::new(accounts());
    h.put_schema(
        "nested.avsc",
        r#"{"type":"record","name":"Account","fields":[{"name":"tags","type":{"type":"array","items":"string"}}]}"#,
    )
    .await;

    let mut table = accounts_table();
    table.push(sluice_core::ConfigOption::new("schema", "nested.avsc"));
    let err = h
        .run(&request(IngestionMode::Full, "parquet"), &oracle_source(), &table)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::UnmappedSchemaType { ref field, .. } if field == "tags"));
    assert!(h.engine.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_endpoint_never_reads() {
    let h = Harness::new(accounts());
    let source = ConfigItem::new("warehouse", opts(&[("dbType", "postgres")]));
    let table = opts(&[("tableName", "orders"), ("host", "pg"), ("port", "5432")]);

    let err = h
        .run(&request(IngestionMode::Full, "parquet"), &source, &table)
        .await
        .unwrap_err();

    assert!(err.is_missing_option());
    assert_eq!(
        err.to_string(),
        "missing mandatory option `dbName` in config section `warehouse`"
    );
    assert!(h.engine.reads.lock().unwrap().is_empty());
    assert!(h.engine.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_db_type_names_source() {
    let h = Harness::new(accounts());
    let source = ConfigItem::new("crm", opts(&[("host", "db1")]));

    let err = h
        .run(&request(IngestionMode::Full, "parquet"), &source, &accounts_table())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "missing mandatory option `dbType` in config section `crm`"
    );
    assert!(h.engine.reads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_daily_appends_previous_day() {
    let h = Harness::new(accounts());
    let table = opts(&[
        ("tableName", "ACCOUNTS"),
        ("host", "db1"),
        ("port", "1521"),
        ("dbName", "ORCL"),
        ("checkField", "UPDATED_ON"),
    ]);

    let daily = request(IngestionMode::Daily, "parquet");
    h.run(&daily, &oracle_source(), &table).await.unwrap();
    h.run(&daily, &oracle_source(), &table).await.unwrap();

    let reads = h.engine.reads.lock().unwrap();
    assert_eq!(
        reads[0].query,
        "(SELECT * FROM ACCOUNTS WHERE UPDATED_ON = TO_DATE('2024-03-14','yyyy-MM-dd'))"
    );

    let writes = h.engine.writes.lock().unwrap();
    assert!(writes.iter().all(|(req, _)| req.mode == WriteMode::Append));

    // Two appends leave two part files side by side.
    let files = sluice_storage::BlobStore::list(h.store.as_ref(), "lake/raw/ACCOUNTS")
        .await
        .unwrap();
    assert_eq!(files.len(), 2);
}

#[tokio::test]
async fn test_incremental_run_overwrites() {
    let h = Harness::new(accounts());
    let source = ConfigItem::new("warehouse", opts(&[("dbType", "postgres")]));
    let table = opts(&[
        ("tableName", "orders"),
        ("url", "postgres://pg.internal:5432/app"),
        ("checkField", "id"),
        ("lastValue", "1000"),
    ]);

    let incremental = request(IngestionMode::Incrementally, "csv");
    h.run(&incremental, &source, &table).await.unwrap();
    let report = h.run(&incremental, &source, &table).await.unwrap();

    assert_eq!(report.query, "(SELECT * FROM orders WHERE id >= 1000)");
    assert_eq!(report.target, "postgres://pg.internal:5432/app");
    let files = sluice_storage::BlobStore::list(h.store.as_ref(), "lake/raw/orders")
        .await
        .unwrap();
    assert_eq!(files, report.files);
}

#[tokio::test]
async fn test_unknown_format_reaches_engine() {
    let h = Harness::new(accounts());
    let err = h
        .run(&request(IngestionMode::Full, "orc"), &oracle_source(), &accounts_table())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Engine(EngineError::UnsupportedFormat(ref f)) if f == "orc"
    ));
    let writes = h.engine.writes.lock().unwrap();
    assert_eq!(writes[0].0.format, "orc");
}
