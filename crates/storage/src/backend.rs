use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use tracing::info;

use sluice_core::config::AwsConfig;

use crate::error::StorageError;

/// Unified storage backend wrapping object_store.
pub enum StorageBackend {
    Local(LocalBackend),
    S3(S3Backend),
}

impl StorageBackend {
    /// Select S3 when AWS credentials and a bucket are configured, the local
    /// data directory otherwise.
    pub fn from_config(config: &sluice_core::Config) -> Result<Self, StorageError> {
        if config.aws.is_configured() {
            Ok(StorageBackend::S3(S3Backend::new(&config.aws)?))
        } else {
            std::fs::create_dir_all(&config.storage.data_dir)?;
            Ok(StorageBackend::Local(LocalBackend::new(&config.storage.data_dir)?))
        }
    }

    /// Get the underlying ObjectStore.
    pub fn store(&self) -> &dyn ObjectStore {
        match self {
            StorageBackend::Local(b) => b.store.as_ref(),
            StorageBackend::S3(b) => b.store.as_ref(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, StorageBackend::S3(_))
    }

    /// S3 key prefix every lake path is placed under (e.g. "production").
    pub fn prefix(&self) -> &str {
        match self {
            StorageBackend::Local(_) => "",
            StorageBackend::S3(b) => &b.prefix,
        }
    }

    /// Human-readable root for log lines.
    pub fn describe(&self) -> String {
        match self {
            StorageBackend::Local(b) => b.data_dir.display().to_string(),
            StorageBackend::S3(b) if b.prefix.is_empty() => format!("s3://{}", b.bucket),
            StorageBackend::S3(b) => format!("s3://{}/{}", b.bucket, b.prefix),
        }
    }
}

/// Local filesystem backend.
pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub data_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(data_dir: &std::path::Path) -> Result<Self, StorageError> {
        let canonical = std::fs::canonicalize(data_dir).unwrap_or_else(|_| data_dir.to_path_buf());
        let store = LocalFileSystem::new_with_prefix(&canonical)
            .map_err(|e| StorageError::Other(format!("local filesystem error: {e}")))?;
        info!(data_dir = %canonical.display(), "storage: local backend");
        Ok(Self {
            store: Arc::new(store),
            data_dir: canonical,
        })
    }
}

/// S3 backend.
pub struct S3Backend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub prefix: String,
}

impl S3Backend {
    pub fn new(aws: &AwsConfig) -> Result<Self, StorageError> {
        let bucket = aws
            .s3_bucket
            .clone()
            .ok_or_else(|| StorageError::NotConfigured("S3_BUCKET not set".into()))?;

        let mut builder = AmazonS3Builder::new().with_region(&aws.region);
        if let Some(key) = &aws.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &aws.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &aws.session_token {
            builder = builder.with_token(token);
        }

        builder = match aws.endpoint_url.as_deref().and_then(absolute_endpoint) {
            Some(endpoint) => builder
                .with_bucket_name(&bucket)
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint),
            None => builder.with_url(format!("s3://{bucket}")),
        };

        let prefix = aws
            .s3_prefix
            .as_deref()
            .map(|p| p.trim_matches('/').to_string())
            .unwrap_or_default();

        let store = builder.build()?;
        info!(bucket = %bucket, prefix = %prefix, region = %aws.region, "storage: S3 backend");

        Ok(Self {
            store: Arc::new(store),
            bucket,
            prefix,
        })
    }
}

/// object_store wants an absolute endpoint URL; bare hosts get `https://`.
fn absolute_endpoint(endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        None
    } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Some(endpoint.to_string())
    } else {
        Some(format!("https://{endpoint}"))
    }
}
