//! A recording [`TabularEngine`] that serves a canned table and hands
//! writes to a real [`LakeEngine`] over a temporary directory.

use std::sync::{Arc, Mutex};

use arrow::array::{BooleanArray, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use sluice_core::{ConfigItem, ConfigOption, Credentials};
use sluice_ingest::*;
use sluice_storage::{BlobStore, LocalBackend, StorageBackend};

pub struct Read {
    pub target: ConnectionTarget,
    pub query: String,
    pub options: ReadOptions,
}

pub struct FakeEngine {
    data: TabularData,
    lake: LakeEngine,
    pub reads: Mutex<Vec<Read>>,
    pub writes: Mutex<Vec<(WriteRequest, TabularData)>>,
}

impl FakeEngine {
    pub fn new(data: TabularData, lake: LakeEngine) -> Self {
        Self {
            data,
            lake,
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TabularEngine for FakeEngine {
    async fn read(
        &self,
        target: &ConnectionTarget,
        query: &str,
        _credentials: &Credentials,
        options: &ReadOptions,
    ) -> Result<TabularData, EngineError> {
        self.reads.lock().unwrap().push(Read {
            target: target.clone(),
            query: query.to_string(),
            options: options.clone(),
        });
        Ok(self.data.clone())
    }

    async fn write(
        &self,
        table: &TabularData,
        request: &WriteRequest,
    ) -> Result<WriteSummary, EngineError> {
        self.writes
            .lock()
            .unwrap()
            .push((request.clone(), table.clone()));
        self.lake.write(table, request).await
    }
}

/// A temporary lake plus an engine serving `data`.
pub struct Harness {
    _dir: TempDir,
    pub store: Arc<StorageBackend>,
    pub engine: FakeEngine,
}

impl Harness {
    pub fn new(data: TabularData) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StorageBackend::Local(LocalBackend::new(dir.path()).unwrap()));
        let engine = FakeEngine::new(data, LakeEngine::new(store.clone()));
        Self { _dir: dir, store, engine }
    }

    pub async fn put_schema(&self, relative: &str, document: &str) {
        self.store
            .put(&format!("schemas/{relative}"), Bytes::from(document.to_string()))
            .await
            .unwrap();
    }

    pub async fn run(
        &self,
        request: &TableRequest,
        source: &ConfigItem,
        table: &[ConfigOption],
    ) -> Result<TableReport, IngestError> {
        process_table(
            &self.engine,
            self.store.as_ref(),
            request,
            source,
            &sink(),
            &Credentials::new().with("user", "etl").with("password", "secret"),
            table,
            run_at(),
        )
        .await
    }
}

pub fn opts(pairs: &[(&str, &str)]) -> Vec<ConfigOption> {
    pairs.iter().map(|(k, v)| ConfigOption::new(*k, *v)).collect()
}

pub fn sink() -> ConfigItem {
    ConfigItem::new("lake", Vec::new())
}

pub fn run_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap()
}

pub fn request(mode: IngestionMode, format: &str) -> TableRequest {
    TableRequest {
        mode,
        format: format.to_string(),
        location: "lake/raw".to_string(),
        schemas_location: "schemas".to_string(),
    }
}

/// `(id: int32, name: utf8, legacy_flag: bool)` with three rows.
pub fn accounts() -> TabularData {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("legacy_flag", DataType::Boolean, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![Some("Alice"), Some("Bob"), None])),
            Arc::new(BooleanArray::from(vec![false, true, false])),
        ],
    )
    .unwrap();
    TabularData::from_batch(batch)
}

pub const ACCOUNTS_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Account",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "name", "type": ["null", "string"]}
    ]
}"#;
