//! Subscription adapter that keeps a UI-facing copy of the favorites list.

use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    favorites::FavoritesStore,
    models::{FavoriteInput, FavoriteMovie, MovieId},
    sync::Subscription,
};

/// Derived, read-only copy of the store contents.
#[derive(Debug, Clone, Default)]
pub struct FavoritesSnapshot {
    /// Full list, most recently added first.
    pub items: Vec<FavoriteMovie>,
    /// Ids present in `items`.
    pub ids: HashSet<MovieId>,
    /// Incremented on every refresh.
    pub revision: u64,
}

impl FavoritesSnapshot {
    fn rebuild(&mut self, items: Vec<FavoriteMovie>) {
        self.ids = items.iter().map(|movie| movie.id).collect();
        self.items = items;
        self.revision += 1;
    }
}

/// Mounted reader of a [`FavoritesStore`].
///
/// Mounting loads the list and subscribes to local and cross-context change
/// signals; dropping the view releases both subscriptions. Any signal
/// triggers a full reload.
pub struct FavoritesView {
    store: FavoritesStore,
    state: Arc<RwLock<FavoritesSnapshot>>,
    _local: Subscription,
    external: Option<Subscription>,
}

impl FavoritesView {
    /// Mount a view on `store`.
    pub fn mount(store: &FavoritesStore) -> Self {
        Self::mount_with(store, || {})
    }

    /// Mount a view that also calls `on_refresh` after each reload.
    ///
    /// `on_refresh` may run on a watcher thread when the store's transport
    /// delivers from one.
    pub fn mount_with(
        store: &FavoritesStore,
        on_refresh: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let state = Arc::new(RwLock::new(FavoritesSnapshot::default()));
        state.write().rebuild(store.load());

        let refresh = {
            let store = store.clone();
            let state = Arc::clone(&state);
            Arc::new(move || {
                let items = store.load();
                let revision = {
                    let mut snapshot = state.write();
                    snapshot.rebuild(items);
                    snapshot.revision
                };
                debug!(context = %store.context(), revision, "favorites view refreshed");
                on_refresh();
            })
        };

        let local = {
            let refresh = Arc::clone(&refresh);
            store.subscribe(move || refresh())
        };
        let external = store.subscribe_external(move || refresh());

        Self {
            store: store.clone(),
            state,
            _local: local,
            external,
        }
    }

    /// Clone of the current list.
    pub fn items(&self) -> Vec<FavoriteMovie> {
        self.state.read().items.clone()
    }

    /// Clone of the current id set.
    pub fn ids(&self) -> HashSet<MovieId> {
        self.state.read().ids.clone()
    }

    /// Clone of the whole derived state.
    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.state.read().clone()
    }

    /// Whether `id` is favorited in the current copy.
    pub fn contains(&self, id: MovieId) -> bool {
        self.state.read().ids.contains(&id)
    }

    /// Whether the current copy is empty.
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Number of favorites in the current copy.
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Refresh counter, useful for cheap change detection.
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Toggle through the store; the view refreshes via the local signal.
    pub fn toggle(&self, movie: impl Into<FavoriteInput>) -> bool {
        self.store.toggle(movie)
    }

    /// Whether the view is listening to other contexts.
    pub fn is_synced(&self) -> bool {
        self.external.is_some()
    }

    /// Release both subscriptions.
    pub fn unmount(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        favorites::FAVORITES_KEY,
        storage::{MemoryBackend, StorageBackend},
        sync::LocalBus,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tab(backend: &Arc<MemoryBackend>, bus: &LocalBus) -> FavoritesStore {
        FavoritesStore::builder(backend.clone())
            .transport(Arc::new(bus.clone()))
            .build()
    }

    #[test]
    fn mount_exposes_initial_state() {
        let backend = Arc::new(MemoryBackend::new());
        let store = FavoritesStore::new(backend);
        store.toggle(FavoriteInput::new(1, "Alpha"));

        let view = FavoritesView::mount(&store);
        assert_eq!(view.len(), 1);
        assert!(view.contains(1));
        assert!(!view.is_empty());
        assert!(!view.is_synced());
    }

    #[test]
    fn toggle_through_view_refreshes_it() {
        let store = FavoritesStore::new(Arc::new(MemoryBackend::new()));
        let view = FavoritesView::mount(&store);
        assert!(view.is_empty());
        let mounted_revision = view.revision();

        assert!(view.toggle(FavoriteInput::new(7, "Seven")));
        assert!(view.contains(7));
        assert_eq!(view.revision(), mounted_revision + 1);

        assert!(!view.toggle(FavoriteInput::new(7, "Seven")));
        assert!(view.is_empty());
    }

    #[test]
    fn sibling_views_in_one_context_stay_in_step() {
        let store = FavoritesStore::new(Arc::new(MemoryBackend::new()));
        let button = FavoritesView::mount(&store);
        let listing = FavoritesView::mount(&store);

        button.toggle(FavoriteInput::new(3, "Gamma"));
        assert_eq!(listing.items()[0].title, "Gamma");
        assert_eq!(listing.ids(), HashSet::from([3]));
    }

    #[test]
    fn change_in_one_tab_reaches_view_in_another() {
        let backend = Arc::new(MemoryBackend::new());
        let bus = LocalBus::new();
        let first_tab = tab(&backend, &bus);
        let second_tab = tab(&backend, &bus);

        let view = FavoritesView::mount(&second_tab);
        assert!(view.is_synced());
        assert!(!view.contains(42));

        assert!(first_tab.toggle(FavoriteInput::new(42, "X")));
        assert!(view.contains(42));
        assert!(second_tab.is_favorite(42));
    }

    #[test]
    fn writes_outside_the_store_are_invisible_until_signalled() {
        let backend = Arc::new(MemoryBackend::new());
        let store = FavoritesStore::new(backend.clone());
        let view = FavoritesView::mount(&store);

        backend
            .set(FAVORITES_KEY, r#"[{"id":1,"title":"Alpha"}]"#)
            .unwrap();
        assert!(view.is_empty());

        store.toggle(FavoriteInput::new(2, "Beta"));
        let ids: Vec<_> = view.items().iter().map(|movie| movie.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn dropping_view_releases_both_subscriptions() {
        let backend = Arc::new(MemoryBackend::new());
        let bus = LocalBus::new();
        let store = tab(&backend, &bus);
        let refreshes = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&refreshes);
        let view = FavoritesView::mount_with(&store, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.subscriber_count(), 1);

        store.toggle(FavoriteInput::new(1, "Alpha"));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        view.unmount();
        assert_eq!(bus.subscriber_count(), 0);

        store.toggle(FavoriteInput::new(2, "Beta"));
        tab(&backend, &bus).toggle(FavoriteInput::new(3, "Gamma"));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }
}
