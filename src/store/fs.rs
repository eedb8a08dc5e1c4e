//! Filesystem state store.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::store::StateStore;

/// Keeps each blob as a file under a base directory, created on first write.
pub struct FsStore {
    base_dir: PathBuf,
}

impl FsStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl StateStore for FsStore {
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.base_dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.base_dir.join(name);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // write beside the target and rename so a crash never leaves a truncated blob
        let file_name = path
            .file_name()
            .ok_or_else(|| StorageError::Backend(format!("invalid blob name {name:?}")))?;
        let mut tmp_name = OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(e));
        }

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let err = store.get("toripoliisi.json").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(name) if name == "toripoliisi.json"));
    }

    #[tokio::test]
    async fn put_replaces_previous_blob() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path().join("nested"));

        store.put("state.json", b"[1,2,3]").await.unwrap();
        store.put("state.json", b"[]").await.unwrap();

        assert_eq!(store.get("state.json").await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn put_leaves_no_temporary_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());

        store.put("state.json", b"[]").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["state.json".to_string()]);
    }

    #[tokio::test]
    async fn stale_temporary_file_does_not_corrupt_state() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        std::fs::write(dir.path().join(".state.json.tmp"), b"[{\"url\":").unwrap();

        store.put("state.json", b"[1]").await.unwrap();

        assert_eq!(store.get("state.json").await.unwrap(), b"[1]");
        assert!(!dir.path().join(".state.json.tmp").exists());
    }
}
