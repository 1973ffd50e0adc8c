use std::{fs, path::Path};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{ChangeTransport, ContextId, Listener, ListenerRegistry, Subscription};
use crate::storage::{file_name_for, FileBackend, StorageError, StorageResult};

/// Cross-process transport that watches a [`FileBackend`] directory.
///
/// Writing the file is the signal, so `publish` does nothing. The filesystem
/// cannot tell writers apart, which means the writing process also hears its
/// own saves; readers simply reload. Listeners run on the watcher thread.
pub struct FileWatchTransport {
    listeners: ListenerRegistry<String>,
    _watcher: Mutex<RecommendedWatcher>,
}

impl FileWatchTransport {
    /// Start watching the directory behind `backend`, creating it if needed.
    pub fn watch(backend: &FileBackend) -> StorageResult<Self> {
        let root = backend.root();
        fs::create_dir_all(root).map_err(|source| StorageError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let listeners: ListenerRegistry<String> = ListenerRegistry::default();
        let dispatch = listeners.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) if is_write(&event.kind) => {
                    for name in event.paths.iter().filter_map(|path| file_name(path)) {
                        let delivered = dispatch.notify_matching(|watched| watched == name);
                        if delivered > 0 {
                            debug!("storage file {name} changed, notified {delivered} listeners");
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => warn!("storage watcher error: {err}"),
            }
        })?;
        watcher.watch(root, RecursiveMode::NonRecursive)?;
        info!("watching {} for storage changes", root.display());

        Ok(Self {
            listeners,
            _watcher: Mutex::new(watcher),
        })
    }
}

impl ChangeTransport for FileWatchTransport {
    fn publish(&self, _key: &str, _origin: ContextId) {}

    fn subscribe(&self, key: &str, _context: ContextId, listener: Listener) -> Subscription {
        self.listeners.register(file_name_for(key), listener)
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBackend;
    use anyhow::Result;
    use std::{sync::mpsc, sync::Arc, time::Duration};
    use tempfile::tempdir;

    #[test]
    fn writes_from_another_backend_are_observed() -> Result<()> {
        let dir = tempdir()?;
        let watched = FileBackend::new(dir.path());
        let transport = FileWatchTransport::watch(&watched)?;

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let _subscription = transport.subscribe(
            "fav-movies",
            ContextId::next(),
            Arc::new(move || {
                let _ = tx.lock().send(());
            }),
        );

        let other_process = FileBackend::new(dir.path());
        other_process.set("unrelated", "{}")?;
        other_process.set("fav-movies", "[]")?;

        rx.recv_timeout(Duration::from_secs(5))?;
        Ok(())
    }
}
