//! Session identity and lifecycle.
//!
//! A session is a client-visible handle with a one-way `Active` → `Zombie`
//! lifecycle, used to key per-session overlay spaces across every active
//! scope. Sessions hold no references to spaces themselves; the scopes'
//! session maps are the sole source of truth, discovered by key lookup.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use dashmap::DashMap;

use crate::error::SessionError;
use crate::event::{ListenerSet, SessionEvent, SessionListener, SessionOp};
use crate::registry::ScopeRegistry;
use crate::scope::is_valid_id;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Live and referenceable.
    Active,
    /// Destroyed; terminal and irreversible.
    Zombie,
}

/// A session handle. Cheap to share; the state flag is the only mutable part.
pub struct Session {
    id: String,
    zombie: AtomicBool,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            zombie: AtomicBool::new(false),
        }
    }

    /// The session's unique, immutable id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.zombie.load(Ordering::Acquire) {
            SessionState::Zombie
        } else {
            SessionState::Active
        }
    }

    /// Whether the session has been destroyed.
    pub fn is_zombie(&self) -> bool {
        self.state() == SessionState::Zombie
    }

    /// Assert the session is still referenceable. No-op while `Active`,
    /// fails once the session is a `Zombie`.
    pub fn open(&self) -> SessionResult<()> {
        if self.is_zombie() {
            return Err(SessionError::NonReferenceable {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    // Monotonic: there is no way back from Zombie.
    fn kill(&self) {
        self.zombie.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Coordinates session creation and destruction across every active scope.
pub struct SessionManager {
    registry: Arc<ScopeRegistry>,
    sessions: DashMap<String, Arc<Session>>,
    listeners: ListenerSet<dyn SessionListener>,
    /// Maximum number of live sessions; negative disables the limit.
    max_sessions: AtomicI32,
    id_prefix: String,
}

impl SessionManager {
    /// Default id prefix for generated session ids.
    pub const DEFAULT_ID_PREFIX: &'static str = "session";

    /// Unlimited session manager over the given registry.
    pub fn new(registry: Arc<ScopeRegistry>) -> Self {
        Self::with_limit(registry, -1)
    }

    /// Session manager with a live-session limit (negative = unlimited).
    pub fn with_limit(registry: Arc<ScopeRegistry>, max_sessions: i32) -> Self {
        Self {
            registry,
            sessions: DashMap::new(),
            listeners: ListenerSet::new(),
            max_sessions: AtomicI32::new(max_sessions),
            id_prefix: Self::DEFAULT_ID_PREFIX.to_owned(),
        }
    }

    /// Subscribe a listener for session lifecycle events.
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.subscribe(listener);
    }

    /// The current live-session limit (negative = unlimited).
    pub fn session_limit(&self) -> i32 {
        self.max_sessions.load(Ordering::Relaxed)
    }

    /// Change the live-session limit. Existing sessions are unaffected.
    pub fn set_session_limit(&self, limit: i32) {
        self.max_sessions.store(limit, Ordering::Relaxed);
    }

    fn check_limit(&self) -> SessionResult<()> {
        let max = self.session_limit();
        if max >= 0 && self.sessions.len() >= max as usize {
            return Err(SessionError::Limit { max });
        }
        Ok(())
    }

    /// Create a session with a generated id.
    pub fn create(&self) -> SessionResult<Arc<Session>> {
        self.check_limit()?;
        loop {
            let id = format!("{}-{:08x}", self.id_prefix, rand::random::<u32>());
            match self.try_register(&id) {
                Ok(session) => return Ok(session),
                Err(SessionError::DuplicateId { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Create a session under a caller-chosen id.
    ///
    /// The duplicate check comes before the limit check, so a caller that
    /// meant to reuse an existing id learns about the collision first.
    pub fn create_with_id(&self, id: &str) -> SessionResult<Arc<Session>> {
        if !is_valid_id(id) {
            return Err(SessionError::InvalidId { id: id.to_owned() });
        }
        if self.sessions.contains_key(id) {
            return Err(SessionError::DuplicateId { id: id.to_owned() });
        }
        self.check_limit()?;
        self.try_register(id)
    }

    fn try_register(&self, id: &str) -> SessionResult<Arc<Session>> {
        let session = Arc::new(Session::new(id.to_owned()));
        match self.sessions.entry(id.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(SessionError::DuplicateId { id: id.to_owned() });
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(session.clone());
            }
        }

        // Every currently active scope gets an overlay for this session.
        for scope in self.registry.active_scopes() {
            if let Err(e) = scope.add_session_space(id) {
                tracing::warn!(scope = scope.id(), session = id, error = %e,
                    "could not attach session space");
            }
        }

        // A concurrent destroy may have swept the scopes while the fan-out
        // was still attaching; no overlay may outlive a zombie session.
        if session.is_zombie() {
            for scope in self.registry.scopes() {
                scope.remove_session_space(id);
            }
        }

        tracing::info!(session = id, "session created");
        let event = SessionEvent {
            session: id.to_owned(),
            op: SessionOp::Created,
        };
        self.listeners.notify(|l| l.session_changed(&event));
        Ok(session)
    }

    /// Destroy a session: detach its space from every registered scope
    /// (active or not), mark it `Zombie`, and drop it from the live set.
    ///
    /// Safe under concurrent duplicate calls: whoever claims the live entry
    /// performs the teardown, later calls find nothing to remove and the
    /// session still reports `Zombie`.
    pub fn destroy(&self, id: &str) {
        let Some((_, session)) = self.sessions.remove(id) else {
            tracing::warn!(session = id, "tried to destroy nonexistent session; was it already destroyed?");
            return;
        };

        for scope in self.registry.scopes() {
            scope.remove_session_space(id);
        }
        session.kill();

        tracing::info!(session = id, "session destroyed");
        let event = SessionEvent {
            session: id.to_owned(),
            op: SessionOp::Destroyed,
        };
        self.listeners.notify(|l| l.session_changed(&event));
    }

    /// Look up a live session.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|r| r.value().clone())
    }

    /// Ids of all live sessions.
    pub fn registered_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of live sessions.
    pub fn registered_count(&self) -> usize {
        self.sessions.len()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .field("limit", &self.session_limit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::OntologyScope;
    use crate::source::BlankSource;

    fn registry_with_scopes() -> Arc<ScopeRegistry> {
        let registry = Arc::new(ScopeRegistry::new());
        for id in ["s1", "s2"] {
            let scope = OntologyScope::create(
                id,
                &BlankSource::named(format!("http://example.org/{id}")),
                None,
            )
            .unwrap();
            registry.register(scope).unwrap();
        }
        registry.set_active("s1", true).unwrap();
        registry
    }

    #[test]
    fn create_attaches_spaces_to_active_scopes_only() {
        let registry = registry_with_scopes();
        let manager = SessionManager::new(registry.clone());

        let session = manager.create().unwrap();
        let s1 = registry.get("s1").unwrap();
        let s2 = registry.get("s2").unwrap();

        assert!(s1.get_session_space(session.id()).is_some());
        assert!(s2.get_session_space(session.id()).is_none());
    }

    #[test]
    fn destroy_is_terminal_and_detaches_everywhere() {
        let registry = registry_with_scopes();
        let manager = SessionManager::new(registry.clone());

        let session = manager.create().unwrap();
        let id = session.id().to_owned();
        assert_eq!(manager.registered_count(), 1);
        session.open().unwrap();

        manager.destroy(&id);
        assert_eq!(manager.registered_count(), 0);
        assert!(session.is_zombie());
        assert!(matches!(session.open(), Err(SessionError::NonReferenceable { .. })));
        assert!(registry.get("s1").unwrap().get_session_space(&id).is_none());

        // Destroying twice is safe and the session stays a zombie.
        manager.destroy(&id);
        assert_eq!(session.state(), SessionState::Zombie);
    }

    #[test]
    fn duplicate_id_beats_limit_check() {
        let registry = Arc::new(ScopeRegistry::new());
        let manager = SessionManager::with_limit(registry, 1);

        manager.create_with_id("only").unwrap();
        // The pool is full, but reusing an id must still surface as a duplicate.
        let err = manager.create_with_id("only").unwrap_err();
        assert!(matches!(err, SessionError::DuplicateId { .. }));

        let err = manager.create_with_id("other").unwrap_err();
        assert!(matches!(err, SessionError::Limit { max: 1 }));
    }

    #[test]
    fn negative_limit_means_unlimited() {
        let registry = Arc::new(ScopeRegistry::new());
        let manager = SessionManager::new(registry);
        for _ in 0..64 {
            manager.create().unwrap();
        }
        assert_eq!(manager.registered_count(), 64);
    }

    #[test]
    fn limit_is_adjustable_at_runtime() {
        let registry = Arc::new(ScopeRegistry::new());
        let manager = SessionManager::with_limit(registry, 0);
        assert!(manager.create().is_err());

        manager.set_session_limit(2);
        manager.create().unwrap();
        manager.create().unwrap();
        assert!(matches!(manager.create(), Err(SessionError::Limit { max: 2 })));
    }

    #[test]
    fn invalid_session_ids_are_rejected() {
        let registry = Arc::new(ScopeRegistry::new());
        let manager = SessionManager::new(registry);
        let err = manager.create_with_id("no spaces allowed").unwrap_err();
        assert!(matches!(err, SessionError::InvalidId { .. }));
    }

    #[test]
    fn bulk_create_destroy_keeps_exact_accounting() {
        let registry = registry_with_scopes();
        let manager = SessionManager::new(registry.clone());
        let baseline = manager.registered_count();

        let mut ids = Vec::new();
        for _ in 0..500 {
            ids.push(manager.create().unwrap().id().to_owned());
        }
        assert_eq!(manager.registered_count(), baseline + 500);
        assert_eq!(registry.get("s1").unwrap().session_count(), 500);

        let handles: Vec<_> = ids.iter().map(|id| manager.get(id).unwrap()).collect();
        for id in &ids {
            manager.destroy(id);
        }
        assert_eq!(manager.registered_count(), baseline);
        assert_eq!(registry.get("s1").unwrap().session_count(), 0);
        for handle in handles {
            assert!(handle.is_zombie());
            assert!(handle.open().is_err());
        }
    }
}
