//! Blob storage for the last-seen snapshot.
//!
//! - [`GcsStore`] keeps the blob in a Google Cloud Storage bucket.
//! - [`FsStore`] keeps it in a local directory.

mod fs;
mod gcs;

pub use fs::FsStore;
pub use gcs::GcsStore;

use crate::error::StorageError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Named blob get/put, last write wins
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the named blob; [`StorageError::NotFound`] if it was never written
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace the named blob
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Where the snapshot lives, parsed from the bucket identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// `gs://bucket` or a bare bucket name
    Gcs(String),
    /// `file:///some/dir`
    Fs(PathBuf),
}

impl StoreLocation {
    pub fn parse(identifier: &str) -> Result<Self, StorageError> {
        let identifier = identifier.trim();
        if let Some(dir) = identifier.strip_prefix("file://") {
            if dir.is_empty() {
                return Err(StorageError::Backend("file:// location needs a directory".into()));
            }
            return Ok(StoreLocation::Fs(PathBuf::from(dir)));
        }

        let bucket = identifier
            .strip_prefix("gs://")
            .unwrap_or(identifier)
            .trim_end_matches('/');
        if bucket.is_empty() || bucket.contains('/') {
            return Err(StorageError::Backend(format!("invalid bucket name {identifier:?}")));
        }
        Ok(StoreLocation::Gcs(bucket.to_string()))
    }
}
