use super::{ChangeTransport, ContextId, Listener, ListenerRegistry, Subscription};

struct Scope {
    key: String,
    context: ContextId,
}

/// In-process transport connecting several contexts that share one backend.
///
/// Delivery is synchronous and skips the publishing context, matching the
/// browser rule that a tab never receives its own storage events.
#[derive(Clone, Default)]
pub struct LocalBus {
    listeners: ListenerRegistry<Scope>,
}

impl LocalBus {
    /// Create a bus with no participants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions across all contexts.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ChangeTransport for LocalBus {
    fn publish(&self, key: &str, origin: ContextId) {
        self.listeners
            .notify_matching(|scope| scope.key == key && scope.context != origin);
    }

    fn subscribe(&self, key: &str, context: ContextId, listener: Listener) -> Subscription {
        self.listeners.register(
            Scope {
                key: key.to_string(),
                context,
            },
            listener,
        )
    }
}
