//! Change events and listener plumbing.
//!
//! Every mutation of a space, the scope registry, or the session manager is
//! described by a plain event value. Events are built while the internal
//! state is locked but published only after the new state has been swapped
//! in, so listeners can freely re-enter the manager without deadlocking or
//! observing a half-applied change.

use std::sync::{Arc, RwLock};

use crate::document::{Document, DocumentKey};
use crate::scope::OntologyScope;
use crate::space::SpaceKind;

/// Direction of a document change inside a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
}

/// A document was added to or removed from one of a scope's spaces.
#[derive(Debug, Clone)]
pub struct SpaceEvent {
    /// Id of the scope owning the space.
    pub scope: String,
    /// Id of the space that changed, `{scope}/{space_type}`.
    pub space: String,
    /// Which kind of space it is.
    pub kind: SpaceKind,
    /// Identity of the affected document.
    pub document: DocumentKey,
    /// Added or removed.
    pub change: ChangeKind,
    /// The document itself, carried on additions so projections need no
    /// backchannel to the space.
    pub content: Option<Document>,
}

/// Lifecycle events of the scope registry.
#[derive(Debug, Clone)]
pub enum ScopeEvent {
    /// A scope was registered. Carries the scope itself so listeners can scan
    /// its current contents, and the registration sequence number used for
    /// deterministic tie-breaks.
    Registered { scope: Arc<OntologyScope>, seq: u64 },
    /// A scope was removed from the registry.
    Deregistered { id: String },
    /// A scope was marked active or inactive for new sessions.
    ActivationChanged { id: String, active: bool },
}

/// Lifecycle operations of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOp {
    Created,
    Destroyed,
}

/// A session was created or destroyed.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session: String,
    pub op: SessionOp,
}

/// Callback interface for space-level document changes.
pub trait SpaceListener: Send + Sync {
    fn space_changed(&self, event: &SpaceEvent);
}

/// Callback interface for registry-level scope changes.
pub trait ScopeListener: Send + Sync {
    fn scope_changed(&self, event: &ScopeEvent);
}

/// Callback interface for session lifecycle changes.
pub trait SessionListener: Send + Sync {
    fn session_changed(&self, event: &SessionEvent);
}

/// Copy-on-write set of listeners.
///
/// Subscription builds a new listener vector and swaps it in; notification
/// walks an `Arc` snapshot, so a listener subscribing or unsubscribing from
/// inside a callback never invalidates the iteration.
pub struct ListenerSet<L: ?Sized> {
    inner: RwLock<Arc<Vec<Arc<L>>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    /// Create an empty listener set.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Add a listener.
    pub fn subscribe(&self, listener: Arc<L>) {
        let mut guard = self.inner.write().expect("listener lock poisoned");
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(listener);
        *guard = Arc::new(next);
    }

    /// Drop all listeners.
    pub fn clear(&self) {
        let mut guard = self.inner.write().expect("listener lock poisoned");
        *guard = Arc::new(Vec::new());
    }

    /// Number of subscribed listeners.
    pub fn len(&self) -> usize {
        self.inner.read().expect("listener lock poisoned").len()
    }

    /// Whether no listeners are subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable snapshot of the current listeners.
    pub fn snapshot(&self) -> Arc<Vec<Arc<L>>> {
        self.inner.read().expect("listener lock poisoned").clone()
    }

    /// Invoke `f` once per subscribed listener, against a stable snapshot.
    pub fn notify(&self, f: impl Fn(&L)) {
        for listener in self.snapshot().iter() {
            f(listener);
        }
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> std::fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("count", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl SpaceListener for Counter {
        fn space_changed(&self, _event: &SpaceEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn event() -> SpaceEvent {
        SpaceEvent {
            scope: "s1".into(),
            space: "s1/custom".into(),
            kind: SpaceKind::Custom,
            document: DocumentKey::Named(crate::document::Uri::new("http://example.org/a")),
            change: ChangeKind::Added,
            content: None,
        }
    }

    #[test]
    fn notify_reaches_all_listeners() {
        let set: ListenerSet<dyn SpaceListener> = ListenerSet::new();
        let a = Arc::new(Counter(AtomicUsize::new(0)));
        let b = Arc::new(Counter(AtomicUsize::new(0)));
        set.subscribe(a.clone());
        set.subscribe(b.clone());

        let e = event();
        set.notify(|l| l.space_changed(&e));

        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_drops_listeners() {
        let set: ListenerSet<dyn SpaceListener> = ListenerSet::new();
        let a = Arc::new(Counter(AtomicUsize::new(0)));
        set.subscribe(a.clone());
        set.clear();
        assert!(set.is_empty());

        let e = event();
        set.notify(|l| l.space_changed(&e));
        assert_eq!(a.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn snapshot_survives_later_subscriptions() {
        let set: ListenerSet<dyn SpaceListener> = ListenerSet::new();
        set.subscribe(Arc::new(Counter(AtomicUsize::new(0))));
        let snap = set.snapshot();
        set.subscribe(Arc::new(Counter(AtomicUsize::new(0))));
        assert_eq!(snap.len(), 1);
        assert_eq!(set.len(), 2);
    }
}
