//! Files written to the lake read back in each output format.

use apache_avro::types::Value as AvroValue;
use apache_avro::Reader;
use arrow::array::{Array, Int64Array, StringArray};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use sluice_core::ConfigOption;
use sluice_ingest::*;
use sluice_storage::BlobStore;

use crate::fake::{accounts, opts, request, Harness, ACCOUNTS_SCHEMA};

fn table(extra: &[(&str, &str)]) -> Vec<ConfigOption> {
    let mut options = opts(&[
        ("tableName", "ACCOUNTS"),
        ("url", "postgres://pg.internal:5432/crm"),
    ]);
    options.extend(opts(extra));
    options
}

fn source() -> sluice_core::ConfigItem {
    sluice_core::ConfigItem::new("crm", opts(&[("dbType", "postgres")]))
}

#[tokio::test]
async fn test_parquet_reads_back_with_metadata() {
    let h = Harness::new(accounts());
    h.put_schema("accounts.avsc", ACCOUNTS_SCHEMA).await;

    let report = h
        .run(
            &request(IngestionMode::Full, "parquet"),
            &source(),
            &table(&[("schema", "accounts.avsc")]),
        )
        .await
        .unwrap();

    let bytes = h.store.open(&report.files[0]).await.unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes).unwrap();
    let kv = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .cloned()
        .unwrap_or_default();
    let lookup = |key: &str| {
        kv.iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.clone())
    };
    assert_eq!(lookup("sluice.table").as_deref(), Some("ACCOUNTS"));
    assert_eq!(lookup("sluice.mode").as_deref(), Some("full"));
    assert_eq!(lookup("sluice.sink").as_deref(), Some("lake"));

    let batches: Vec<_> = builder.build().unwrap().map(|b| b.unwrap()).collect();
    let batch = &batches[0];
    assert_eq!(batch.num_columns(), 2);
    let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(ids.values(), &[1, 2, 3]);
    let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(names.value(0), "Alice");
    assert!(names.is_null(2));
}

#[tokio::test]
async fn test_avro_alias_writes_container_files() {
    let h = Harness::new(accounts());
    h.put_schema("accounts.avsc", ACCOUNTS_SCHEMA).await;

    let report = h
        .run(
            &request(IngestionMode::Full, "avro"),
            &source(),
            &table(&[("schema", "accounts.avsc")]),
        )
        .await
        .unwrap();

    assert!(report.files[0].ends_with(".avro"));
    let writes = h.engine.writes.lock().unwrap();
    assert_eq!(writes[0].0.format, AVRO_WRITER);

    let bytes = h.store.open(&report.files[0]).await.unwrap();
    let reader = Reader::new(&bytes[..]).unwrap();
    let records: Vec<AvroValue> = reader.map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    let AvroValue::Record(fields) = &records[0] else {
        panic!("expected a record");
    };
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["id", "name"]);
    assert_eq!(fields[0].1, AvroValue::Union(1, Box::new(AvroValue::Long(1))));
}

#[tokio::test]
async fn test_partitioned_csv_layout() {
    let h = Harness::new(accounts());
    let report = h
        .run(
            &request(IngestionMode::Full, "csv"),
            &source(),
            &table(&[("partitionKeys", "legacy_flag")]),
        )
        .await
        .unwrap();

    assert_eq!(report.files.len(), 2);
    assert!(report.files[0].starts_with("lake/raw/ACCOUNTS/legacy_flag=false/"));
    assert!(report.files[1].starts_with("lake/raw/ACCOUNTS/legacy_flag=true/"));

    let body = h.store.open(&report.files[1]).await.unwrap();
    let text = std::str::from_utf8(&body).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec!["id,name", "2,Bob"]);
}

#[tokio::test]
async fn test_json_lines_output() {
    let h = Harness::new(accounts());
    let report = h
        .run(&request(IngestionMode::Full, "json"), &source(), &table(&[]))
        .await
        .unwrap();

    let body = h.store.open(&report.files[0]).await.unwrap();
    let rows: Vec<serde_json::Value> = std::str::from_utf8(&body)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["name"], "Bob");
    assert_eq!(rows[1]["legacy_flag"], true);
}
