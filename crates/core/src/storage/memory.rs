use std::collections::HashMap;

use parking_lot::RwLock;

use super::{StorageBackend, StorageResult};

/// In-process backend, shared between contexts by wrapping it in an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
