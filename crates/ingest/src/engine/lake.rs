//! The concrete engine: sqlx-backed reads, blob-store-backed writes.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use sluice_core::Credentials;
use sluice_storage::{join_path, BlobStore};

use crate::connection::ConnectionTarget;
use crate::mode::WriteMode;

use super::error::EngineError;
use super::options::ReadOptions;
use super::partition::split_by_column;
use super::writer::OutputFormat;
use super::{postgres, TabularData, TabularEngine, WriteRequest, WriteSummary};

const POSTGRES_SCHEMES: &[&str] = &["postgres://", "postgresql://"];

/// Reads Postgres-compatible sources and writes files into a [`BlobStore`].
#[derive(Clone)]
pub struct LakeEngine {
    sink: Arc<dyn BlobStore>,
}

impl LakeEngine {
    pub fn new(sink: Arc<dyn BlobStore>) -> Self {
        Self { sink }
    }
}

impl std::fmt::Debug for LakeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LakeEngine").finish_non_exhaustive()
    }
}

fn part_file_name(index: usize, format: OutputFormat) -> String {
    format!("part-{index:05}-{}.{}", Uuid::new_v4(), format.extension())
}

#[async_trait]
impl TabularEngine for LakeEngine {
    async fn read(
        &self,
        target: &ConnectionTarget,
        query: &str,
        credentials: &Credentials,
        options: &ReadOptions,
    ) -> Result<TabularData, EngineError> {
        if !POSTGRES_SCHEMES.iter().any(|s| target.url.starts_with(s)) {
            let shown = if target.url.is_empty() {
                format!("<empty> ({})", target.family)
            } else {
                target.redacted()
            };
            return Err(EngineError::UnsupportedTarget(shown));
        }

        info!(target = %target.redacted(), "reading from source");
        postgres::read(&target.url, query, credentials, options).await
    }

    async fn write(
        &self,
        table: &TabularData,
        request: &WriteRequest,
    ) -> Result<WriteSummary, EngineError> {
        // Validate before touching the destination so a bad format never
        // clears existing output.
        let format = OutputFormat::parse(&request.format)?;
        let batch = table.concat()?;

        let parts = match &request.partition_by {
            Some(column) => split_by_column(&batch, column)?
                .into_iter()
                .map(|(dir, part)| (join_path(&[&request.destination, &dir]), part))
                .collect(),
            None => vec![(request.destination.clone(), batch)],
        };

        let record_name = request
            .destination
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("record");

        // Every part is encoded before the destination is touched, so a
        // failing column leaves the previous load in place.
        let mut encoded = Vec::with_capacity(parts.len());
        let mut summary = WriteSummary::default();
        for (index, (dir, part)) in parts.iter().enumerate() {
            let body = format.encode(part, &request.metadata, record_name)?;
            let path = join_path(&[dir, &part_file_name(index, format)]);
            summary.rows += part.num_rows() as u64;
            encoded.push((path, Bytes::from(body)));
        }

        if request.mode == WriteMode::Overwrite {
            let prefix = format!("{}/", request.destination.trim_end_matches('/'));
            summary.replaced = self.sink.delete_prefix(&prefix).await?;
            debug!(destination = %request.destination, removed = summary.replaced, "cleared destination");
        }

        for (path, body) in encoded {
            self.sink.put(&path, body).await?;
            summary.files.push(path);
        }

        info!(
            destination = %request.destination,
            format = %format,
            mode = %request.mode,
            files = summary.files.len(),
            rows = summary.rows,
            "wrote table"
        );
        Ok(summary)
    }
}
