//! Change notification between the favorites store and its readers.
//!
//! Two channels exist. Local notifications are delivered synchronously by a
//! [`ListenerRegistry`] owned by the store. Cross-context notifications
//! (other tabs, other processes) travel over a [`ChangeTransport`].

mod bus;
mod watch;

pub use bus::LocalBus;
pub use watch::FileWatchTransport;

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use parking_lot::Mutex;

/// Zero-argument change callback.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Identity of one execution context (a tab, a window, a process).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate an identifier unique within this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Delivery of storage-change signals between contexts.
pub trait ChangeTransport: Send + Sync {
    /// Announce that `origin` has just written `key`.
    fn publish(&self, key: &str, origin: ContextId);

    /// Call `listener` whenever a context other than `context` writes `key`.
    fn subscribe(&self, key: &str, context: ContextId, listener: Listener) -> Subscription;
}

/// Registration handle; the listener is removed when this is dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap the action that removes a registration.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the registration now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Observer set whose entries carry a tag used to filter deliveries.
pub struct ListenerRegistry<T = ()> {
    inner: Arc<Mutex<Entries<T>>>,
}

struct Entries<T> {
    next_id: u64,
    listeners: BTreeMap<u64, (T, Listener)>,
}

impl<T> Clone for ListenerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                next_id: 0,
                listeners: BTreeMap::new(),
            })),
        }
    }
}

impl<T: Send + 'static> ListenerRegistry<T> {
    /// Add `listener` under `tag`.
    pub fn register(&self, tag: T, listener: Listener) -> Subscription {
        let id = {
            let mut entries = self.inner.lock();
            let id = entries.next_id;
            entries.next_id += 1;
            entries.listeners.insert(id, (tag, listener));
            id
        };

        let registry: Weak<Mutex<Entries<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.lock().listeners.remove(&id);
            }
        })
    }

    /// Invoke, in registration order, every listener whose tag matches.
    ///
    /// The lock is released before any listener runs, so listeners may
    /// subscribe or unsubscribe freely. Returns the number of calls made.
    pub fn notify_matching(&self, mut matches: impl FnMut(&T) -> bool) -> usize {
        let targets: Vec<Listener> = self
            .inner
            .lock()
            .listeners
            .values()
            .filter(|(tag, _)| matches(tag))
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in &targets {
            listener();
        }
        targets.len()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ListenerRegistry<()> {
    /// Add an untagged listener.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        self.register((), listener)
    }

    /// Invoke every listener.
    pub fn notify(&self) -> usize {
        self.notify_matching(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        let listener: Listener = Arc::new(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn dropping_subscription_deregisters() {
        let registry: ListenerRegistry = ListenerRegistry::default();
        let (count, listener) = counter();

        let subscription = registry.subscribe(listener);
        assert_eq!(registry.notify(), 1);
        drop(subscription);

        assert!(registry.is_empty());
        assert_eq!(registry.notify(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_unsubscribe_only_removes_its_own_entry() {
        let registry: ListenerRegistry = ListenerRegistry::default();
        let (first_count, first) = counter();
        let (second_count, second) = counter();

        let first_sub = registry.subscribe(first);
        let _second_sub = registry.subscribe(second);
        first_sub.unsubscribe();

        registry.notify();
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_may_unsubscribe_during_delivery() {
        let registry: ListenerRegistry = ListenerRegistry::default();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner_slot = Arc::clone(&slot);
        let subscription = registry.subscribe(Arc::new(move || {
            inner_slot.lock().take();
        }));
        *slot.lock() = Some(subscription);

        assert_eq!(registry.notify(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry: ListenerRegistry = ListenerRegistry::default();
        let (_count, listener) = counter();
        let subscription = registry.subscribe(listener);
        drop(registry);
        drop(subscription);
    }

    #[test]
    fn context_ids_are_unique() {
        let a = ContextId::next();
        let b = ContextId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("ctx-"));
    }
}
