//! Path-keyed blob access used by ingestion: schema documents are fetched
//! through [`BlobStore::open`], table output is written with `put` and
//! cleared with `delete_prefix`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// A key/value blob store addressed by `/`-separated relative paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the whole object at `path`.
    async fn open(&self, path: &str) -> Result<Bytes, StorageError>;

    /// Create or replace the object at `path`.
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StorageError>;

    /// List object paths under `prefix`, sorted. A missing prefix lists nothing.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete every object under `prefix`; returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError>;
}

/// Join path segments, dropping empty ones and stray slashes.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl StorageBackend {
    fn object_path(&self, path: &str) -> Path {
        Path::from(join_path(&[self.prefix(), path]).as_str())
    }

    fn relative_key(&self, key: &str) -> String {
        let prefix = self.prefix();
        if prefix.is_empty() {
            return key.to_string();
        }
        key.strip_prefix(prefix)
            .map(|k| k.trim_start_matches('/').to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

#[async_trait]
impl BlobStore for StorageBackend {
    async fn open(&self, path: &str) -> Result<Bytes, StorageError> {
        let location = self.object_path(path);
        debug!(path = %location, "opening blob");
        let bytes = self.store().get(&location).await?.bytes().await?;
        Ok(bytes)
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<(), StorageError> {
        let location = self.object_path(path);
        debug!(path = %location, bytes = data.len(), "writing blob");
        self.store().put(&location, data.into()).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let location = self.object_path(prefix);
        let listed: Result<Vec<_>, _> = self.store().list(Some(&location)).try_collect().await;
        let metas = match listed {
            Ok(metas) => metas,
            Err(object_store::Error::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let mut keys: Vec<String> = metas
            .into_iter()
            .map(|meta| self.relative_key(meta.location.as_ref()))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys = self.list(prefix).await?;
        for key in &keys {
            self.store().delete(&self.object_path(key)).await?;
        }
        if !keys.is_empty() {
            debug!(prefix = %prefix, removed = keys.len(), "cleared blobs");
        }
        Ok(keys.len())
    }
}
