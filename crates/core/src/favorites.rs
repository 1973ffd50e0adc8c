//! Persistent favorites list with change notification.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    models::{FavoriteInput, FavoriteMovie, MovieId},
    storage::{FileBackend, StorageBackend},
    sync::{
        ChangeTransport, ContextId, FileWatchTransport, Listener, ListenerRegistry, Subscription,
    },
};

/// Storage key holding the serialised favorites list.
pub const FAVORITES_KEY: &str = "fav-movies";

/// Message shown after a toggle control adds a movie.
pub const ADDED_MESSAGE: &str = "Success Add to Favorites";
/// Message shown after a toggle control removes a movie.
pub const REMOVED_MESSAGE: &str = "Removed from Favorites";

/// Toast text for the outcome of [`FavoritesStore::toggle`].
pub fn toggle_message(now_favorited: bool) -> &'static str {
    if now_favorited {
        ADDED_MESSAGE
    } else {
        REMOVED_MESSAGE
    }
}

/// Favorites list for one execution context.
///
/// Cloning is cheap and every clone shares the same backend, context identity
/// and listener set. Persistence failures never reach the caller: reads
/// degrade to an empty list and failed writes are logged and dropped.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn StorageBackend>,
    key: String,
    context: ContextId,
    local: ListenerRegistry,
    transport: Option<Arc<dyn ChangeTransport>>,
}

/// Builder for [`FavoritesStore`].
pub struct FavoritesStoreBuilder {
    backend: Arc<dyn StorageBackend>,
    key: String,
    transport: Option<Arc<dyn ChangeTransport>>,
}

impl FavoritesStoreBuilder {
    /// Override the storage key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Attach a cross-context transport.
    pub fn transport(mut self, transport: Arc<dyn ChangeTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Finish construction, allocating a fresh context identity.
    pub fn build(self) -> FavoritesStore {
        FavoritesStore {
            inner: Arc::new(Inner {
                backend: self.backend,
                key: self.key,
                context: ContextId::next(),
                local: ListenerRegistry::default(),
                transport: self.transport,
            }),
        }
    }
}

impl FavoritesStore {
    /// Store on `backend` under the default key, without cross-context delivery.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::builder(backend).build()
    }

    /// File-backed store described by `config`.
    ///
    /// When watching is enabled but the watcher cannot start, the store still
    /// works and simply misses changes made by other processes.
    pub fn open(config: &AppConfig) -> Self {
        let backend = FileBackend::new(&config.data_dir);
        let mut builder = Self::builder(Arc::new(backend.clone())).key(&config.favorites_key);
        if config.watch_storage {
            match FileWatchTransport::watch(&backend) {
                Ok(transport) => builder = builder.transport(Arc::new(transport)),
                Err(err) => warn!("favorites will not sync between instances: {err}"),
            }
        }
        builder.build()
    }

    /// Start configuring a store.
    pub fn builder(backend: Arc<dyn StorageBackend>) -> FavoritesStoreBuilder {
        FavoritesStoreBuilder {
            backend,
            key: FAVORITES_KEY.to_string(),
            transport: None,
        }
    }

    /// Storage key in use.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Identity of this context on the transport.
    pub fn context(&self) -> ContextId {
        self.inner.context
    }

    /// Read the persisted list, most recently added first.
    pub fn load(&self) -> Vec<FavoriteMovie> {
        let raw = match self.inner.backend.get(&self.inner.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("favorites unavailable, treating as empty: {err}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<FavoriteMovie>>(&raw) {
            Ok(list) => unique_by_id(list),
            Err(err) => {
                warn!("ignoring unreadable favorites under {:?}: {err}", self.inner.key);
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted list and notify listeners.
    ///
    /// Only the first entry for each id is written. Local listeners run before
    /// this returns. A write the backend rejects is dropped without notifying
    /// anyone.
    pub fn save(&self, list: &[FavoriteMovie]) {
        let mut seen = HashSet::with_capacity(list.len());
        let list: Vec<&FavoriteMovie> = list
            .iter()
            .filter(|entry| seen.insert(entry.id))
            .collect();
        let serialised = match serde_json::to_string(&list) {
            Ok(serialised) => serialised,
            Err(err) => {
                warn!("failed to serialise favorites: {err}");
                return;
            }
        };
        if let Err(err) = self.inner.backend.set(&self.inner.key, &serialised) {
            warn!("dropping favorites write: {err}");
            return;
        }
        debug!(
            context = %self.inner.context,
            count = list.len(),
            "saved favorites"
        );

        self.inner.local.notify();
        if let Some(transport) = &self.inner.transport {
            transport.publish(&self.inner.key, self.inner.context);
        }
    }

    /// Add the movie if absent, remove it if present.
    ///
    /// Returns `true` when the movie is favorited afterwards.
    pub fn toggle(&self, movie: impl Into<FavoriteInput>) -> bool {
        let input = movie.into();
        let mut list = self.load();

        if let Some(index) = list.iter().position(|entry| entry.id == input.id) {
            list.remove(index);
            self.save(&list);
            return false;
        }

        list.insert(0, FavoriteMovie::from(input));
        self.save(&list);
        true
    }

    /// Remove the movie with `id`; returns whether it was present.
    pub fn remove(&self, id: MovieId) -> bool {
        let mut list = self.load();
        let before = list.len();
        list.retain(|entry| entry.id != id);
        if list.len() == before {
            return false;
        }
        self.save(&list);
        true
    }

    /// Remove every favorite.
    pub fn clear(&self) {
        self.save(&[]);
    }

    /// Whether a movie with `id` is in the list.
    pub fn is_favorite(&self, id: MovieId) -> bool {
        self.load().iter().any(|entry| entry.id == id)
    }

    /// Register a callback for saves made through this context.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.local.subscribe(Arc::new(listener))
    }

    /// Register a callback for saves made by other contexts.
    ///
    /// Returns `None` when the store has no transport.
    pub fn subscribe_external(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Option<Subscription> {
        let transport = self.inner.transport.as_ref()?;
        let listener: Listener = Arc::new(listener);
        Some(transport.subscribe(&self.inner.key, self.inner.context, listener))
    }
}

fn unique_by_id(list: Vec<FavoriteMovie>) -> Vec<FavoriteMovie> {
    let mut seen = HashSet::with_capacity(list.len());
    list.into_iter()
        .filter(|entry| seen.insert(entry.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DetachedBackend, MemoryBackend};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory_store() -> (Arc<MemoryBackend>, FavoritesStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = FavoritesStore::new(backend.clone());
        (backend, store)
    }

    fn ids(store: &FavoritesStore) -> Vec<MovieId> {
        store.load().iter().map(|movie| movie.id).collect()
    }

    #[test]
    fn empty_store_loads_nothing() {
        let (_, store) = memory_store();
        assert!(store.load().is_empty());
        assert!(!store.is_favorite(1));
    }

    #[test]
    fn alpha_beta_scenario() {
        let (_, store) = memory_store();

        assert!(store.toggle(FavoriteInput::new(1, "Alpha")));
        assert_eq!(
            store.load(),
            vec![FavoriteMovie::from(FavoriteInput::new(1, "Alpha"))]
        );

        assert!(store.toggle(FavoriteInput::new(2, "Beta")));
        assert_eq!(ids(&store), vec![2, 1]);

        assert!(!store.toggle(FavoriteInput::new(1, "Alpha")));
        assert_eq!(ids(&store), vec![2]);
        assert_eq!(store.load()[0].title, "Beta");
    }

    #[test]
    fn toggle_twice_restores_original_set() {
        let (_, store) = memory_store();
        store.toggle(FavoriteInput::new(10, "Kept"));
        let before = store.load();

        assert!(store.toggle(FavoriteInput::new(11, "Transient")));
        assert!(!store.toggle(FavoriteInput::new(11, "Transient")));
        assert_eq!(store.load(), before);
    }

    #[test]
    fn newest_favorite_comes_first() {
        let (_, store) = memory_store();
        for (id, title) in [(1, "A"), (2, "B"), (3, "C")] {
            store.toggle(FavoriteInput::new(id, title));
        }
        let titles: Vec<_> = store.load().into_iter().map(|movie| movie.title).collect();
        assert_eq!(titles, ["C", "B", "A"]);
    }

    #[test]
    fn toggle_sequences_never_duplicate_ids() {
        let (_, store) = memory_store();
        let mut seed: u64 = 0x2545_f491;
        for _ in 0..200 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let id = seed % 7;
            store.toggle(FavoriteInput::new(id, format!("movie {id}")));

            let current = ids(&store);
            let unique: HashSet<_> = current.iter().copied().collect();
            assert_eq!(unique.len(), current.len());
        }
    }

    #[test]
    fn readding_replaces_snapshot_and_position() {
        let (_, store) = memory_store();
        store.toggle(FavoriteInput::new(1, "Old title"));
        store.toggle(FavoriteInput::new(2, "Other"));

        store.toggle(FavoriteInput::new(1, "Old title"));
        store.toggle(FavoriteInput::new(1, "New title"));

        let list = store.load();
        assert_eq!(list[0].id, 1);
        assert_eq!(list[0].title, "New title");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn corrupt_value_loads_empty_until_overwritten() {
        let (backend, store) = memory_store();
        backend.set(FAVORITES_KEY, "definitely not json").unwrap();

        assert!(store.load().is_empty());
        assert!(!store.is_favorite(1));
        assert_eq!(
            backend.get(FAVORITES_KEY).unwrap().as_deref(),
            Some("definitely not json")
        );

        assert!(store.toggle(FavoriteInput::new(1, "Alpha")));
        assert_eq!(ids(&store), vec![1]);
    }

    #[test]
    fn duplicate_entries_from_other_writers_are_collapsed() {
        let (backend, store) = memory_store();
        backend
            .set(
                FAVORITES_KEY,
                r#"[{"id":5,"title":"Newer"},{"id":6,"title":"Six"},{"id":5,"title":"Older"}]"#,
            )
            .unwrap();

        let list = store.load();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "Newer");
    }

    #[test]
    fn save_writes_each_id_once() {
        let (backend, store) = memory_store();
        let newer = FavoriteMovie::from(FavoriteInput::new(1, "Newer"));
        let older = FavoriteMovie::from(FavoriteInput::new(1, "Older"));
        store.save(&[newer.clone(), newer.clone(), older]);

        let raw = backend.get(FAVORITES_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"id":1,"title":"Newer"}]"#);
        assert_eq!(store.load(), vec![newer]);
    }

    #[test]
    fn file_keys_differing_only_in_punctuation_stay_apart() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(dir.path()));
        let colon = FavoritesStore::builder(backend.clone()).key("tmdb:favorites").build();
        let underscore = FavoritesStore::builder(backend).key("tmdb_favorites").build();

        assert!(colon.toggle(FavoriteInput::new(7, "Seven")));
        assert!(colon.is_favorite(7));
        assert!(!underscore.is_favorite(7));
        Ok(())
    }

    #[test]
    fn persisted_form_omits_absent_fields() {
        let (backend, store) = memory_store();
        store.toggle(FavoriteInput {
            poster_path: None,
            vote_average: Some(7.5),
            ..FavoriteInput::new(9, "Nine")
        });

        let raw = backend.get(FAVORITES_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"id":9,"title":"Nine","vote_average":7.5}]"#);
    }

    #[test]
    fn unavailable_storage_degrades_silently() {
        let store = FavoritesStore::new(Arc::new(DetachedBackend));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _subscription = store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.toggle(FavoriteInput::new(1, "Alpha")));
        assert!(store.load().is_empty());
        assert!(!store.is_favorite(1));
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn local_listeners_see_new_state_before_save_returns() {
        let (_, store) = memory_store();
        let observed: Arc<Mutex<Vec<Vec<MovieId>>>> = Arc::default();

        let reader = store.clone();
        let sink = Arc::clone(&observed);
        let subscription = store.subscribe(move || {
            sink.lock().push(ids(&reader));
        });

        store.toggle(FavoriteInput::new(1, "Alpha"));
        assert_eq!(*observed.lock(), vec![vec![1]]);

        store.toggle(FavoriteInput::new(2, "Beta"));
        assert_eq!(observed.lock().last(), Some(&vec![2, 1]));

        drop(subscription);
        store.toggle(FavoriteInput::new(3, "Gamma"));
        assert_eq!(observed.lock().len(), 2);
    }

    #[test]
    fn remove_and_clear() {
        let (_, store) = memory_store();
        store.toggle(FavoriteInput::new(1, "Alpha"));
        store.toggle(FavoriteInput::new(2, "Beta"));

        assert!(store.remove(1));
        assert!(!store.remove(1));
        assert_eq!(ids(&store), vec![2]);

        store.clear();
        assert!(store.load().is_empty());
    }

    #[test]
    fn custom_key_is_isolated() {
        let backend = Arc::new(MemoryBackend::new());
        let default = FavoritesStore::new(backend.clone());
        let legacy = FavoritesStore::builder(backend.clone())
            .key("tmdb:favorites")
            .build();

        legacy.toggle(FavoriteInput::new(1, "Alpha"));
        assert!(legacy.is_favorite(1));
        assert!(!default.is_favorite(1));
        assert_eq!(legacy.key(), "tmdb:favorites");
        assert!(default.subscribe_external(|| {}).is_none());
    }

    #[test]
    fn open_uses_configured_directory_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().join("storage"),
            favorites_key: "favs".to_string(),
            watch_storage: false,
            ..AppConfig::default()
        };

        let store = FavoritesStore::open(&config);
        store.toggle(FavoriteInput::new(1, "Alpha"));
        assert!(dir.path().join("storage").join("favs.json").exists());
        assert!(FavoritesStore::open(&config).is_favorite(1));
        assert!(store.subscribe_external(|| {}).is_none());
    }

    #[test]
    fn toggle_messages() {
        assert_eq!(toggle_message(true), "Success Add to Favorites");
        assert_eq!(toggle_message(false), "Removed from Favorites");
    }
}
