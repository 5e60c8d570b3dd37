//! Process-wide scope registry.
//!
//! Holds every registered scope under its unique id plus the set of scopes
//! marked active for new sessions. Mutations are serialized through a single
//! writer lock and build a whole new state that is swapped in atomically, so
//! concurrent readers always iterate a fully consistent (if slightly stale)
//! snapshot and never observe a torn collection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::RegistryError;
use crate::event::{ListenerSet, ScopeEvent, ScopeListener};
use crate::scope::OntologyScope;

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Default, Clone)]
struct RegistryState {
    /// Scope id → (scope, registration sequence number).
    scopes: HashMap<String, (Arc<OntologyScope>, u64)>,
    /// Scopes that receive a session space for each new session.
    active: HashSet<String>,
}

/// Global id → scope map with an active/inactive flag per scope.
pub struct ScopeRegistry {
    state: RwLock<Arc<RegistryState>>,
    listeners: ListenerSet<dyn ScopeListener>,
    next_seq: AtomicU64,
}

impl ScopeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Arc::new(RegistryState::default())),
            listeners: ListenerSet::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Subscribe a listener for scope lifecycle events.
    pub fn subscribe(&self, listener: Arc<dyn ScopeListener>) {
        self.listeners.subscribe(listener);
    }

    fn snapshot(&self) -> Arc<RegistryState> {
        self.state.read().expect("registry lock poisoned").clone()
    }

    /// Register a scope. New scopes start inactive; activate them explicitly
    /// before they should receive session spaces.
    pub fn register(&self, scope: OntologyScope) -> RegistryResult<Arc<OntologyScope>> {
        let scope = Arc::new(scope);
        let seq = {
            let mut guard = self.state.write().expect("registry lock poisoned");
            if guard.scopes.contains_key(scope.id()) {
                return Err(RegistryError::DuplicateId {
                    id: scope.id().to_owned(),
                });
            }
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let mut next = (**guard).clone();
            next.scopes.insert(scope.id().to_owned(), (scope.clone(), seq));
            *guard = Arc::new(next);
            seq
        };

        tracing::info!(scope = scope.id(), seq, "scope registered");
        let event = ScopeEvent::Registered {
            scope: scope.clone(),
            seq,
        };
        self.listeners.notify(|l| l.scope_changed(&event));
        Ok(scope)
    }

    /// Remove a scope and all its spaces. Session bookkeeping that still
    /// references the id becomes stale-safe: lookups simply return `None`.
    pub fn unregister(&self, id: &str) -> RegistryResult<()> {
        let removed = {
            let mut guard = self.state.write().expect("registry lock poisoned");
            if !guard.scopes.contains_key(id) {
                return Err(RegistryError::NoSuchScope { id: id.to_owned() });
            }
            let mut next = (**guard).clone();
            let removed = next.scopes.remove(id);
            next.active.remove(id);
            *guard = Arc::new(next);
            removed
        };

        if let Some((scope, _)) = removed {
            scope.clear_session_spaces();
        }

        tracing::info!(scope = id, "scope unregistered");
        let event = ScopeEvent::Deregistered { id: id.to_owned() };
        self.listeners.notify(|l| l.scope_changed(&event));
        Ok(())
    }

    /// Toggle whether new sessions automatically receive a session space in
    /// this scope. Existing sessions are not touched either way.
    pub fn set_active(&self, id: &str, active: bool) -> RegistryResult<()> {
        {
            let mut guard = self.state.write().expect("registry lock poisoned");
            if !guard.scopes.contains_key(id) {
                return Err(RegistryError::NoSuchScope { id: id.to_owned() });
            }
            let mut next = (**guard).clone();
            if active {
                next.active.insert(id.to_owned());
            } else {
                next.active.remove(id);
            }
            *guard = Arc::new(next);
        }

        tracing::debug!(scope = id, active, "scope activation changed");
        let event = ScopeEvent::ActivationChanged {
            id: id.to_owned(),
            active,
        };
        self.listeners.notify(|l| l.scope_changed(&event));
        Ok(())
    }

    /// Whether the scope is currently marked active. Unknown ids are inactive.
    pub fn is_active(&self, id: &str) -> bool {
        self.snapshot().active.contains(id)
    }

    /// Look up a registered scope.
    pub fn get(&self, id: &str) -> Option<Arc<OntologyScope>> {
        self.snapshot().scopes.get(id).map(|(scope, _)| scope.clone())
    }

    /// Whether a scope is registered under this id.
    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().scopes.contains_key(id)
    }

    /// The registration sequence number of a scope, if registered.
    pub fn registration_seq(&self, id: &str) -> Option<u64> {
        self.snapshot().scopes.get(id).map(|(_, seq)| *seq)
    }

    /// All registered scopes, in registration order.
    pub fn scopes(&self) -> Vec<Arc<OntologyScope>> {
        let snap = self.snapshot();
        let mut entries: Vec<_> = snap.scopes.values().cloned().collect();
        entries.sort_by_key(|(_, seq)| *seq);
        entries.into_iter().map(|(scope, _)| scope).collect()
    }

    /// The active scopes, in registration order.
    pub fn active_scopes(&self) -> Vec<Arc<OntologyScope>> {
        let snap = self.snapshot();
        let mut entries: Vec<_> = snap
            .scopes
            .iter()
            .filter(|(id, _)| snap.active.contains(*id))
            .map(|(_, entry)| entry.clone())
            .collect();
        entries.sort_by_key(|(_, seq)| *seq);
        entries.into_iter().map(|(scope, _)| scope).collect()
    }

    /// Number of registered scopes.
    pub fn count(&self) -> usize {
        self.snapshot().scopes.len()
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("ScopeRegistry")
            .field("scopes", &snap.scopes.len())
            .field("active", &snap.active.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BlankSource;
    use std::sync::atomic::AtomicUsize;

    fn scope(id: &str) -> OntologyScope {
        OntologyScope::create(id, &BlankSource::named(format!("http://example.org/{id}")), None)
            .unwrap()
    }

    #[test]
    fn duplicate_registration_is_rejected_and_count_unchanged() {
        let registry = ScopeRegistry::new();
        registry.register(scope("users")).unwrap();
        assert_eq!(registry.count(), 1);

        let err = registry.register(scope("users")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { .. }));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn unregister_removes_scope_and_sessions() {
        let registry = ScopeRegistry::new();
        let s = registry.register(scope("users")).unwrap();
        s.add_session_space("sess1").unwrap();

        registry.unregister("users").unwrap();
        assert!(registry.get("users").is_none());
        assert_eq!(s.session_count(), 0);

        let err = registry.unregister("users").unwrap_err();
        assert!(matches!(err, RegistryError::NoSuchScope { .. }));
    }

    #[test]
    fn activation_is_explicit_and_toggleable() {
        let registry = ScopeRegistry::new();
        registry.register(scope("users")).unwrap();
        assert!(!registry.is_active("users"));

        registry.set_active("users", true).unwrap();
        assert!(registry.is_active("users"));
        assert_eq!(registry.active_scopes().len(), 1);

        registry.set_active("users", false).unwrap();
        assert!(!registry.is_active("users"));

        let err = registry.set_active("ghost", true).unwrap_err();
        assert!(matches!(err, RegistryError::NoSuchScope { .. }));
    }

    #[test]
    fn scopes_iterate_in_registration_order() {
        let registry = ScopeRegistry::new();
        registry.register(scope("c")).unwrap();
        registry.register(scope("a")).unwrap();
        registry.register(scope("b")).unwrap();

        let ids: Vec<_> = registry.scopes().iter().map(|s| s.id().to_owned()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(registry.registration_seq("c"), Some(0));
        assert_eq!(registry.registration_seq("b"), Some(2));
    }

    #[test]
    fn lifecycle_events_reach_listeners() {
        struct Counting {
            registered: AtomicUsize,
            removed: AtomicUsize,
        }
        impl ScopeListener for Counting {
            fn scope_changed(&self, event: &ScopeEvent) {
                match event {
                    ScopeEvent::Registered { .. } => {
                        self.registered.fetch_add(1, Ordering::SeqCst);
                    }
                    ScopeEvent::Deregistered { .. } => {
                        self.removed.fetch_add(1, Ordering::SeqCst);
                    }
                    ScopeEvent::ActivationChanged { .. } => {}
                }
            }
        }

        let registry = ScopeRegistry::new();
        let listener = Arc::new(Counting {
            registered: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        registry.subscribe(listener.clone());

        registry.register(scope("users")).unwrap();
        registry.unregister("users").unwrap();

        assert_eq!(listener.registered.load(Ordering::SeqCst), 1);
        assert_eq!(listener.removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_reads_are_stable_across_mutation() {
        let registry = ScopeRegistry::new();
        registry.register(scope("a")).unwrap();
        let before = registry.scopes();
        registry.register(scope("b")).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(registry.scopes().len(), 2);
    }
}
