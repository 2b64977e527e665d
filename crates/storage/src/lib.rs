//! Lake storage: object_store-backed blob access for schema documents and
//! table output, on the local filesystem or S3.

pub mod backend;
pub mod blob;
pub mod error;

pub use backend::{LocalBackend, S3Backend, StorageBackend};
pub use blob::{join_path, BlobStore};
pub use error::StorageError;
