//! Snapshot persistence.
//!
//! The kernel only ever hands a store opaque bytes. `MemoryStore` keeps them
//! in memory (tests, embedding); `FileStore` keeps them in one file on the
//! host filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ShellError, ShellResult};

/// Where snapshots go.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// The last saved snapshot, or `None` if nothing was ever saved.
    async fn load(&self) -> ShellResult<Option<Vec<u8>>>;

    /// Replace the saved snapshot.
    async fn save(&self, bytes: &[u8]) -> ShellResult<()>;
}

/// In-memory persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn load(&self) -> ShellResult<Option<Vec<u8>>> {
        Ok(self.bytes.lock().await.clone())
    }

    async fn save(&self, bytes: &[u8]) -> ShellResult<()> {
        *self.bytes.lock().await = Some(bytes.to_vec());
        Ok(())
    }
}

/// Persistence in a single host file.
///
/// Saves write a sibling `.partial` file and rename it over the target, so
/// a reader never sees half a snapshot.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PersistenceStore for FileStore {
    async fn load(&self) -> ShellResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ShellError::Persistence(format!("{}: {}", self.path.display(), e))),
        }
    }

    async fn save(&self, bytes: &[u8]) -> ShellResult<()> {
        let io_err = |e: std::io::Error| ShellError::Persistence(format!("{}: {}", self.path.display(), e));
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }
        let tmp = self.path.with_extension("partial");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        store.save(b"abc").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(b"abc".to_vec()));
    }

    #[tokio::test]
    async fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("state.json"));
        store.save(b"{\"v\":1}").await.unwrap();
        store.save(b"{\"v\":2}").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(b"{\"v\":2}".to_vec()));
        assert!(!dir.path().join("nested").join("state.partial").exists());
    }

    #[tokio::test]
    async fn file_store_reports_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is an existing directory, so the rename fails.
        let target = dir.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();
        let err = FileStore::new(&target).save(b"x").await.unwrap_err();
        assert_eq!(err.kind(), vsh_types::ErrorKind::PersistenceError);
    }
}
