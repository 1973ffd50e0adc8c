//! Key-value persistence backends for client-side state.

mod file;
mod memory;

pub(crate) use file::file_name_for;
pub use file::{FileBackend, DEFAULT_STORAGE_DIR};
pub use memory::MemoryBackend;

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a [`StorageBackend`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium is not reachable from this context.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Filesystem failure while reading or writing a value.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The change watcher could not be installed.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Synchronous string key-value store shared by every context of one user.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Backend for contexts with no storage at all; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedBackend;

impl StorageBackend for DetachedBackend {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("no storage attached".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("no storage attached".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_backend_rejects_everything() {
        let backend = DetachedBackend;
        assert!(matches!(
            backend.get("fav-movies"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(backend.set("fav-movies", "[]").is_err());
    }
}
