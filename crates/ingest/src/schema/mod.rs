//! Registered schemas: fetch an Avro schema document, translate it into an
//! Arrow schema, and reshape extracted data to match it.

mod avro;
mod reconcile;

use sluice_storage::{join_path, BlobStore};
use tracing::debug;

use crate::error::IngestError;

pub use avro::avro_to_arrow;
pub use reconcile::reconcile;

/// Read the schema document at `<root>/<relative>`.
pub async fn fetch_schema(
    blobs: &dyn BlobStore,
    root: &str,
    relative: &str,
) -> Result<String, IngestError> {
    let path = join_path(&[root, relative]);
    debug!(path = %path, "fetching registered schema");
    let bytes = blobs.open(&path).await?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| IngestError::SchemaParse(format!("{path}: not valid UTF-8: {e}")))
}
