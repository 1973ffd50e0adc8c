use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{StorageBackend, StorageError, StorageResult};

/// Directory under the user's data directory used for persisted state.
pub const DEFAULT_STORAGE_DIR: &str = "cinefav/storage";

/// Backend storing each key in its own file inside one directory.
///
/// Every process pointed at the same directory shares the same values, the
/// way browser tabs of one origin share local storage.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STORAGE_DIR)
    }

    /// Directory holding the value files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name_for(key))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        // Write beside the target and rename so readers never see a torn value.
        let mut staged = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        staged.write_all(value.as_bytes()).map_err(io_err)?;
        staged.flush().map_err(io_err)?;
        staged.persist(&path).map_err(|err| io_err(err.error))?;

        debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// File name used to store `key`.
///
/// Distinct keys always map to distinct names: ASCII letters, digits and `-`
/// pass through and every other byte becomes `_XX` in hex.
pub(crate) fn file_name_for(key: &str) -> String {
    format!("{}.json", encode_component(key))
}

fn encode_component(input: &str) -> String {
    if input.is_empty() {
        return "_".to_string();
    }
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("_{byte:02X}"));
        }
    }
    encoded
}
