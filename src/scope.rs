//! Ontology scopes: one core space, one custom space, per-session overlays.
//!
//! A scope is created once from a core document source (which locks the core
//! space) and an optional custom source. Session spaces come and go only
//! through the session lifecycle protocol; the scope's session map is the
//! sole source of truth for which sessions overlay it.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

use crate::document::{Document, Uri};
use crate::error::ScopeError;
use crate::event::{ChangeKind, ListenerSet, SpaceEvent, SpaceListener};
use crate::library;
use crate::source::DocumentSource;
use crate::space::{OntologySpace, SpaceKind};

/// Result type for scope operations.
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+$").expect("id regex is valid"));

/// Whether a string is a legal scope or session id: a non-empty alphanumeric
/// sequence with optional underscores, dots or dashes.
pub(crate) fn is_valid_id(id: &str) -> bool {
    ID_RE.is_match(id)
}

/// Aggregate of one core space, one custom space, and zero or more
/// per-session spaces, under one immutable id.
pub struct OntologyScope {
    id: String,
    core: OntologySpace,
    custom: OntologySpace,
    sessions: RwLock<Arc<HashMap<String, Arc<OntologySpace>>>>,
    listeners: Arc<ListenerSet<dyn SpaceListener>>,
}

impl OntologyScope {
    /// Assemble a scope: core space built from `core_source` (setting its
    /// top document, which locks it), custom space empty and unlocked,
    /// holding the custom source's document as a direct child when given.
    pub fn create(
        id: &str,
        core_source: &dyn DocumentSource,
        custom_source: Option<&dyn DocumentSource>,
    ) -> ScopeResult<OntologyScope> {
        if !is_valid_id(id) {
            return Err(ScopeError::InvalidId { id: id.to_owned() });
        }

        let listeners: Arc<ListenerSet<dyn SpaceListener>> = Arc::new(ListenerSet::new());
        let core = OntologySpace::with_listeners(id, SpaceKind::Core, None, listeners.clone());
        core.set_top(core_source)?;

        let custom = OntologySpace::with_listeners(id, SpaceKind::Custom, None, listeners.clone());
        if let Some(source) = custom_source {
            custom.add_document(source)?;
        }

        tracing::info!(scope = id, "ontology scope created");
        Ok(Self {
            id: id.to_owned(),
            core,
            custom,
            sessions: RwLock::new(Arc::new(HashMap::new())),
            listeners,
        })
    }

    /// The scope's unique, immutable id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The read-only core space.
    pub fn core_space(&self) -> &OntologySpace {
        &self.core
    }

    /// The mutable per-scope custom space.
    pub fn custom_space(&self) -> &OntologySpace {
        &self.custom
    }

    /// Subscribe a listener to document events from all of this scope's
    /// spaces, session spaces included.
    pub fn subscribe_spaces(&self, listener: Arc<dyn SpaceListener>) {
        self.listeners.subscribe(listener);
    }

    fn sessions_snapshot(&self) -> Arc<HashMap<String, Arc<OntologySpace>>> {
        self.sessions.read().expect("session map lock poisoned").clone()
    }

    /// Attach a fresh, empty, unlocked session space keyed by `session_id`.
    pub fn add_session_space(&self, session_id: &str) -> ScopeResult<()> {
        let mut guard = self.sessions.write().expect("session map lock poisoned");
        if guard.contains_key(session_id) {
            return Err(ScopeError::DuplicateSession {
                scope: self.id.clone(),
                session: session_id.to_owned(),
            });
        }
        let space = Arc::new(OntologySpace::with_listeners(
            &self.id,
            SpaceKind::Session,
            Some(session_id),
            self.listeners.clone(),
        ));
        let mut next = (**guard).clone();
        next.insert(session_id.to_owned(), space);
        *guard = Arc::new(next);
        tracing::debug!(scope = %self.id, session = session_id, "session space attached");
        Ok(())
    }

    /// Detach and discard the session space for `session_id`. Idempotent:
    /// a space that is already absent is a success, since destruction may
    /// race with a per-scope creation that never completed.
    pub fn remove_session_space(&self, session_id: &str) {
        let removed = {
            let mut guard = self.sessions.write().expect("session map lock poisoned");
            if !guard.contains_key(session_id) {
                return;
            }
            let mut next = (**guard).clone();
            let removed = next.remove(session_id);
            *guard = Arc::new(next);
            removed
        };

        // The detached space's documents leave the scope with it; announce
        // them so projections stay exact.
        if let Some(space) = removed {
            for document in space.documents() {
                if let Some(key) = document.key() {
                    let event = SpaceEvent {
                        scope: self.id.clone(),
                        space: space.id().to_owned(),
                        kind: SpaceKind::Session,
                        document: key,
                        change: ChangeKind::Removed,
                        content: None,
                    };
                    self.listeners.notify(|l| l.space_changed(&event));
                }
            }
            tracing::debug!(scope = %self.id, session = session_id, "session space detached");
        }
    }

    /// The session space for `session_id`, if one is attached.
    pub fn get_session_space(&self, session_id: &str) -> Option<Arc<OntologySpace>> {
        self.sessions_snapshot().get(session_id).cloned()
    }

    /// Ids of the sessions currently overlaying this scope.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions_snapshot().keys().cloned().collect()
    }

    /// Number of attached session spaces.
    pub fn session_count(&self) -> usize {
        self.sessions_snapshot().len()
    }

    /// All session spaces, for projection scans.
    pub fn session_spaces(&self) -> Vec<Arc<OntologySpace>> {
        self.sessions_snapshot().values().cloned().collect()
    }

    /// Detach every session space. Used when the scope leaves the registry.
    pub(crate) fn clear_session_spaces(&self) {
        for session_id in self.session_ids() {
            self.remove_session_space(&session_id);
        }
    }

    /// Synthesize the scope's root document: named `{namespace}{id}`,
    /// importing the root of each non-empty permanent space.
    pub fn as_document(&self, namespace: &Uri) -> Document {
        let mut root = Document::named(namespace.join(&self.id));
        for space in [&self.custom, &self.core] {
            if !space.is_empty() {
                root = root.with_added_import(namespace.join(space.id()));
            }
        }
        root
    }

    /// Synthesize a root document importing every document managed by the
    /// permanent spaces directly.
    pub fn flattened_document(&self, namespace: &Uri) -> Document {
        let mut documents = self.core.documents();
        documents.extend(self.custom.documents());
        let root = Document::named(namespace.join(&self.id));
        library::build_import_tree(&documents, Some(&root))
    }
}

impl std::fmt::Debug for OntologyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologyScope")
            .field("id", &self.id)
            .field("core", &self.core.len())
            .field("custom", &self.custom.len())
            .field("sessions", &self.session_count())
            .finish()
    }
}
